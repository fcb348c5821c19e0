//
// Copyright (C) 2025 Ariel Abreu
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! Static catalog of instruction templates, organized by ISA subset.
//!
//! Each raw entry is `(mnemonic, syntax, immediate alignments)`; the operand
//! slots an instruction needs are derived from the placeholder tokens in its
//! syntax string (`xregN`, `fregN`, `immW`/`uimmW`, `symbol`), so the tables
//! stay one line per opcode. The `{}` token is an expansion-time hole (CSR
//! name, rounding mode, vector register) and is not an operand slot.

use std::collections::HashMap;

use lazy_static::lazy_static;

/// An instruction template plus the operand slots it needs filled.
#[derive(Debug, Clone)]
pub struct OpTemplate {
	pub mnemonic: &'static str,
	pub syntax: &'static str,
	pub xregs: Vec<&'static str>,
	pub fregs: Vec<&'static str>,
	pub imms: Vec<(&'static str, u64)>,
	pub symbols: Vec<&'static str>,
}

pub(crate) type RawOp = (&'static str, &'static str, &'static [(&'static str, u64)]);

const RV32I_RTYPE: &[RawOp] = &[
	("add", "add xreg0, xreg1, xreg2", &[]),
	("sub", "sub xreg0, xreg1, xreg2", &[]),
	("sll", "sll xreg0, xreg1, xreg2", &[]),
	("slt", "slt xreg0, xreg1, xreg2", &[]),
	("sltu", "sltu xreg0, xreg1, xreg2", &[]),
	("xor", "xor xreg0, xreg1, xreg2", &[]),
	("srl", "srl xreg0, xreg1, xreg2", &[]),
	("sra", "sra xreg0, xreg1, xreg2", &[]),
	("or", "or xreg0, xreg1, xreg2", &[]),
	("and", "and xreg0, xreg1, xreg2", &[]),
];

pub(crate) const RV32I_ITYPE: &[RawOp] = &[
	("jalr", "jalr xreg0, 0(xreg1)", &[]),
	("lb", "lb xreg0, imm6(xreg1)", &[("imm6", 1)]),
	("lh", "lh xreg0, imm6(xreg1)", &[("imm6", 2)]),
	("lw", "lw xreg0, imm6(xreg1)", &[("imm6", 4)]),
	("lbu", "lbu xreg0, imm6(xreg1)", &[("imm6", 1)]),
	("lhu", "lhu xreg0, imm6(xreg1)", &[("imm6", 2)]),
	("slli", "slli xreg0, xreg1, uimm5", &[]),
	("srli", "srli xreg0, xreg1, uimm5", &[]),
	("srai", "srai xreg0, xreg1, uimm5", &[]),
	("addi", "addi xreg0, xreg1, imm12", &[]),
	("slti", "slti xreg0, xreg1, imm12", &[]),
	("sltiu", "sltiu xreg0, xreg1, imm12", &[]),
	("xori", "xori xreg0, xreg1, imm12", &[]),
	("ori", "ori xreg0, xreg1, imm12", &[]),
	("andi", "andi xreg0, xreg1, imm12", &[]),
	("fence", "fence", &[]),
	("ecall", "ecall", &[]),
	("ebreak", "ebreak", &[]),
];

pub(crate) const RV32I_STYPE: &[RawOp] = &[
	("sb", "sb xreg0, imm6(xreg1)", &[("imm6", 1)]),
	("sh", "sh xreg0, imm6(xreg1)", &[("imm6", 2)]),
	("sw", "sw xreg0, imm6(xreg1)", &[("imm6", 4)]),
];

const RV32I_BTYPE: &[RawOp] = &[
	("beq", "beq xreg0, xreg1, symbol", &[]),
	("bne", "bne xreg0, xreg1, symbol", &[]),
	("blt", "blt xreg0, xreg1, symbol", &[]),
	("bge", "bge xreg0, xreg1, symbol", &[]),
	("bltu", "bltu xreg0, xreg1, symbol", &[]),
	("bgeu", "bgeu xreg0, xreg1, symbol", &[]),
];

const RV32I_UTYPE: &[RawOp] = &[
	("lui", "lui xreg0, uimm20", &[]),
	("auipc", "auipc xreg0, uimm20", &[]),
];

pub(crate) const RV32I_JTYPE: &[RawOp] = &[("jal", "jal xreg0, symbol", &[])];

const RV64I_RTYPE: &[RawOp] = &[
	("addw", "addw xreg0, xreg1, xreg2", &[]),
	("subw", "subw xreg0, xreg1, xreg2", &[]),
	("sllw", "sllw xreg0, xreg1, xreg2", &[]),
	("srlw", "srlw xreg0, xreg1, xreg2", &[]),
	("sraw", "sraw xreg0, xreg1, xreg2", &[]),
];

const RV64I_ITYPE: &[RawOp] = &[
	("lwu", "lwu xreg0, imm6(xreg1)", &[("imm6", 4)]),
	("ld", "ld xreg0, imm6(xreg1)", &[("imm6", 8)]),
	("slli", "slli xreg0, xreg1, uimm6", &[]),
	("srli", "srli xreg0, xreg1, uimm6", &[]),
	("srai", "srai xreg0, xreg1, uimm6", &[]),
	("addiw", "addiw xreg0, xreg1, imm12", &[]),
	("slliw", "slliw xreg0, xreg1, uimm5", &[]),
	("srliw", "srliw xreg0, xreg1, uimm5", &[]),
	("sraiw", "sraiw xreg0, xreg1, uimm5", &[]),
];

const RV64I_STYPE: &[RawOp] = &[("sd", "sd xreg0, imm6(xreg1)", &[("imm6", 8)])];

const RV_ZIFENCEI: &[RawOp] = &[
	("fence.i", "fence.i", &[]),
	("sfence.vma", "sfence.vma xreg0, xreg1", &[]),
];

const RV_ZICSR: &[RawOp] = &[
	("csrrw", "csrrw xreg0, {}, xreg1", &[]),
	("csrrs", "csrrs xreg0, {}, xreg1", &[]),
	("csrrc", "csrrc xreg0, {}, xreg1", &[]),
	("csrrwi", "csrrwi xreg0, {}, uimm5", &[]),
	("csrrsi", "csrrsi xreg0, {}, uimm5", &[]),
	("csrrci", "csrrci xreg0, {}, uimm5", &[]),
];

const RV32M: &[RawOp] = &[
	("mul", "mul xreg0, xreg1, xreg2", &[]),
	("mulh", "mulh xreg0, xreg1, xreg2", &[]),
	("mulhsu", "mulhsu xreg0, xreg1, xreg2", &[]),
	("mulhu", "mulhu xreg0, xreg1, xreg2", &[]),
	("div", "div xreg0, xreg1, xreg2", &[]),
	("divu", "divu xreg0, xreg1, xreg2", &[]),
	("rem", "rem xreg0, xreg1, xreg2", &[]),
	("remu", "remu xreg0, xreg1, xreg2", &[]),
];

const RV64M: &[RawOp] = &[
	("mulw", "mulw xreg0, xreg1, xreg2", &[]),
	("divw", "divw xreg0, xreg1, xreg2", &[]),
	("divuw", "divuw xreg0, xreg1, xreg2", &[]),
	("remw", "remw xreg0, xreg1, xreg2", &[]),
	("remuw", "remuw xreg0, xreg1, xreg2", &[]),
];

const RV32A: &[RawOp] = &[
	("lr.w", "lr.w xreg0, (xreg1)", &[]),
	("sc.w", "sc.w xreg0, xreg2, (xreg1)", &[]),
	("amoswap.w", "amoswap.w xreg0, xreg2, (xreg1)", &[]),
	("amoadd.w", "amoadd.w xreg0, xreg2, (xreg1)", &[]),
	("amoxor.w", "amoxor.w xreg0, xreg2, (xreg1)", &[]),
	("amoand.w", "amoand.w xreg0, xreg2, (xreg1)", &[]),
	("amoor.w", "amoor.w xreg0, xreg2, (xreg1)", &[]),
	("amomin.w", "amomin.w xreg0, xreg2, (xreg1)", &[]),
	("amomax.w", "amomax.w xreg0, xreg2, (xreg1)", &[]),
	("amominu.w", "amominu.w xreg0, xreg2, (xreg1)", &[]),
	("amomaxu.w", "amomaxu.w xreg0, xreg2, (xreg1)", &[]),
];

const RV64A: &[RawOp] = &[
	("lr.d", "lr.d xreg0, (xreg1)", &[]),
	("sc.d", "sc.d xreg0, xreg2, (xreg1)", &[]),
	("amoswap.d", "amoswap.d xreg0, xreg2, (xreg1)", &[]),
	("amoadd.d", "amoadd.d xreg0, xreg2, (xreg1)", &[]),
	("amoxor.d", "amoxor.d xreg0, xreg2, (xreg1)", &[]),
	("amoand.d", "amoand.d xreg0, xreg2, (xreg1)", &[]),
	("amoor.d", "amoor.d xreg0, xreg2, (xreg1)", &[]),
	("amomin.d", "amomin.d xreg0, xreg2, (xreg1)", &[]),
	("amomax.d", "amomax.d xreg0, xreg2, (xreg1)", &[]),
	("amominu.d", "amominu.d xreg0, xreg2, (xreg1)", &[]),
	("amomaxu.d", "amomaxu.d xreg0, xreg2, (xreg1)", &[]),
];

const RV32F: &[RawOp] = &[
	("fadd.s", "fadd.s freg0, freg1, freg2, {}", &[]),
	("fsub.s", "fsub.s freg0, freg1, freg2, {}", &[]),
	("fmul.s", "fmul.s freg0, freg1, freg2, {}", &[]),
	("fdiv.s", "fdiv.s freg0, freg1, freg2, {}", &[]),
	("fsqrt.s", "fsqrt.s freg0, freg1, {}", &[]),
	("fsgnj.s", "fsgnj.s freg0, freg1, freg2", &[]),
	("fsgnjn.s", "fsgnjn.s freg0, freg1, freg2", &[]),
	("fsgnjx.s", "fsgnjx.s freg0, freg1, freg2", &[]),
	("fmin.s", "fmin.s freg0, freg1, freg2", &[]),
	("fmax.s", "fmax.s freg0, freg1, freg2", &[]),
	("fcvt.w.s", "fcvt.w.s xreg0, freg0, {}", &[]),
	("fcvt.wu.s", "fcvt.wu.s xreg0, freg0, {}", &[]),
	("fmv.x.w", "fmv.x.w xreg0, freg0", &[]),
	("feq.s", "feq.s xreg0, freg0, freg1", &[]),
	("flt.s", "flt.s xreg0, freg0, freg1", &[]),
	("fle.s", "fle.s xreg0, freg0, freg1", &[]),
	("fclass.s", "fclass.s xreg0, freg0", &[]),
	("fcvt.s.w", "fcvt.s.w freg0, xreg0, {}", &[]),
	("fcvt.s.wu", "fcvt.s.wu freg0, xreg0, {}", &[]),
	("fmv.w.x", "fmv.w.x freg0, xreg0", &[]),
	("fmadd.s", "fmadd.s freg0, freg1, freg2, freg3, {}", &[]),
	("fmsub.s", "fmsub.s freg0, freg1, freg2, freg3, {}", &[]),
	("fnmsub.s", "fnmsub.s freg0, freg1, freg2, freg3, {}", &[]),
	("fnmadd.s", "fnmadd.s freg0, freg1, freg2, freg3, {}", &[]),
	("flw", "flw freg0, imm6(xreg1)", &[("imm6", 4)]),
	("fsw", "fsw freg0, imm6(xreg1)", &[("imm6", 4)]),
];

const RV64F: &[RawOp] = &[
	("fcvt.l.s", "fcvt.l.s xreg0, freg0, {}", &[]),
	("fcvt.lu.s", "fcvt.lu.s xreg0, freg0, {}", &[]),
	("fcvt.s.l", "fcvt.s.l freg0, xreg0, {}", &[]),
	("fcvt.s.lu", "fcvt.s.lu freg0, xreg0, {}", &[]),
];

const RV32D: &[RawOp] = &[
	("fadd.d", "fadd.d freg0, freg1, freg2, {}", &[]),
	("fsub.d", "fsub.d freg0, freg1, freg2, {}", &[]),
	("fmul.d", "fmul.d freg0, freg1, freg2, {}", &[]),
	("fdiv.d", "fdiv.d freg0, freg1, freg2, {}", &[]),
	("fsqrt.d", "fsqrt.d freg0, freg1, {}", &[]),
	("fsgnj.d", "fsgnj.d freg0, freg1, freg2", &[]),
	("fsgnjn.d", "fsgnjn.d freg0, freg1, freg2", &[]),
	("fsgnjx.d", "fsgnjx.d freg0, freg1, freg2", &[]),
	("fmin.d", "fmin.d freg0, freg1, freg2", &[]),
	("fmax.d", "fmax.d freg0, freg1, freg2", &[]),
	("fcvt.d.s", "fcvt.d.s freg0, freg1, {}", &[]),
	("fcvt.s.d", "fcvt.s.d freg0, freg1, {}", &[]),
	("feq.d", "feq.d xreg0, freg0, freg1", &[]),
	("flt.d", "flt.d xreg0, freg0, freg1", &[]),
	("fle.d", "fle.d xreg0, freg0, freg1", &[]),
	("fclass.d", "fclass.d xreg0, freg0", &[]),
	("fcvt.w.d", "fcvt.w.d xreg0, freg0, {}", &[]),
	("fcvt.wu.d", "fcvt.wu.d xreg0, freg0, {}", &[]),
	("fcvt.d.w", "fcvt.d.w freg0, xreg0, {}", &[]),
	("fcvt.d.wu", "fcvt.d.wu freg0, xreg0, {}", &[]),
	("fmadd.d", "fmadd.d freg0, freg1, freg2, freg3, {}", &[]),
	("fmsub.d", "fmsub.d freg0, freg1, freg2, freg3, {}", &[]),
	("fnmsub.d", "fnmsub.d freg0, freg1, freg2, freg3, {}", &[]),
	("fnmadd.d", "fnmadd.d freg0, freg1, freg2, freg3, {}", &[]),
	("fld", "fld freg0, imm6(xreg1)", &[("imm6", 4)]),
	("fsd", "fsd freg0, imm6(xreg1)", &[("imm6", 4)]),
];

const RV64D: &[RawOp] = &[
	("fcvt.l.d", "fcvt.l.d xreg0, freg0, {}", &[]),
	("fcvt.lu.d", "fcvt.lu.d xreg0, freg0, {}", &[]),
	("fmv.x.d", "fmv.x.d xreg0, freg0", &[]),
	("fcvt.d.l", "fcvt.d.l freg0, xreg0, {}", &[]),
	("fcvt.d.lu", "fcvt.d.lu freg0, xreg0, {}", &[]),
	("fmv.d.x", "fmv.d.x freg0, xreg0", &[]),
];

const RV32Q: &[RawOp] = &[
	("fadd.q", "fadd.q freg0, freg1, freg2, {}", &[]),
	("fsub.q", "fsub.q freg0, freg1, freg2, {}", &[]),
	("fmul.q", "fmul.q freg0, freg1, freg2, {}", &[]),
	("fdiv.q", "fdiv.q freg0, freg1, freg2, {}", &[]),
	("fsqrt.q", "fsqrt.q freg0, freg1, {}", &[]),
	("fsgnj.q", "fsgnj.q freg0, freg1, freg2", &[]),
	("fsgnjn.q", "fsgnjn.q freg0, freg1, freg2", &[]),
	("fsgnjx.q", "fsgnjx.q freg0, freg1, freg2", &[]),
	("fmin.q", "fmin.q freg0, freg1, freg2", &[]),
	("fmax.q", "fmax.q freg0, freg1, freg2", &[]),
	("fcvt.q.s", "fcvt.q.s freg0, freg1, {}", &[]),
	("fcvt.s.q", "fcvt.s.q freg0, freg1, {}", &[]),
	("fcvt.q.d", "fcvt.q.d freg0, freg1, {}", &[]),
	("fcvt.d.q", "fcvt.d.q freg0, freg1, {}", &[]),
	("feq.q", "feq.q xreg0, freg0, freg1", &[]),
	("flt.q", "flt.q xreg0, freg0, freg1", &[]),
	("fle.q", "fle.q xreg0, freg0, freg1", &[]),
	("fclass.q", "fclass.q xreg0, freg0", &[]),
	("fcvt.wu.q", "fcvt.wu.q xreg0, freg0, {}", &[]),
	("fcvt.w.q", "fcvt.w.q xreg0, freg0, {}", &[]),
	("fcvt.q.w", "fcvt.q.w freg0, xreg0, {}", &[]),
	("fcvt.q.wu", "fcvt.q.wu freg0, xreg0, {}", &[]),
	("fmadd.q", "fmadd.q freg0, freg1, freg2, freg3, {}", &[]),
	("fmsub.q", "fmsub.q freg0, freg1, freg2, freg3, {}", &[]),
	("fnmsub.q", "fnmsub.q freg0, freg1, freg2, freg3, {}", &[]),
	("fnmadd.q", "fnmadd.q freg0, freg1, freg2, freg3, {}", &[]),
	("flq", "flq freg0, imm6(xreg1)", &[("imm6", 4)]),
	("fsq", "fsq freg0, imm6(xreg1)", &[("imm6", 4)]),
];

const RV64Q: &[RawOp] = &[
	("fcvt.l.q", "fcvt.l.q xreg0, freg0, {}", &[]),
	("fcvt.lu.q", "fcvt.lu.q xreg0, freg0, {}", &[]),
	("fmv.x.q", "fmv.x.q xreg0, freg0", &[]),
	("fcvt.q.l", "fcvt.q.l freg0, xreg0, {}", &[]),
	("fcvt.q.lu", "fcvt.q.lu freg0, xreg0, {}", &[]),
	("fmv.q.x", "fmv.q.x freg0, xreg0", &[]),
];

const TRAP_RET: &[RawOp] = &[
	("mret", "mret", &[]),
	("sret", "sret", &[]),
	("uret", "uret", &[]),
];

const HYPERVISOR: &[RawOp] = &[
	("hfence.vvma", "hfence.vvma xreg0, xreg1", &[]),
	("hfence.gvma", "hfence.gvma xreg0, xreg1", &[]),
	("hlv.b", "hlv.b xreg0, (xreg1)", &[]),
	("hlv.bu", "hlv.bu xreg0, (xreg1)", &[]),
	("hlv.h", "hlv.h xreg0, (xreg1)", &[]),
	("hlv.hu", "hlv.hu xreg0, (xreg1)", &[]),
	("hlv.w", "hlv.w xreg0, (xreg1)", &[]),
	("hlv.d", "hlv.d xreg0, (xreg1)", &[]),
	("hlvx.wu", "hlvx.wu xreg0, (xreg1)", &[]),
	("hlvx.hu", "hlvx.hu xreg0, (xreg1)", &[]),
	("hsv.b", "hsv.b xreg0, (xreg1)", &[]),
	("hsv.h", "hsv.h xreg0, (xreg1)", &[]),
	("hsv.w", "hsv.w xreg0, (xreg1)", &[]),
	("hsv.d", "hsv.d xreg0, (xreg1)", &[]),
	("wfi", "wfi", &[]),
];

const CBO: &[RawOp] = &[
	("cbo.clean", "cbo.clean (xreg1)", &[]),
	("cbo.flush", "cbo.flush (xreg1)", &[]),
	("cbo.inval", "cbo.inval (xreg1)", &[]),
	("cbo.zero", "cbo.zero (xreg1)", &[]),
	("prefetch.i", "prefetch.i imm12(xreg1)", &[("imm12", 32)]),
	("prefetch.r", "prefetch.r imm12(xreg1)", &[("imm12", 32)]),
	("prefetch.w", "prefetch.w imm12(xreg1)", &[("imm12", 32)]),
];

const VECTOR_CONFIG: &[RawOp] = &[
	("vsetvli", "vsetvli xreg0, xreg1, {}", &[]),
	("vsetvl", "vsetvl xreg0, xreg1, xreg2", &[]),
];

const VECTOR_MEM: &[RawOp] = &[
	("vle8.v", "vle8.v {}, (xreg1)", &[]),
	("vle16.v", "vle16.v {}, (xreg1)", &[]),
	("vle32.v", "vle32.v {}, (xreg1)", &[]),
	("vle64.v", "vle64.v {}, (xreg1)", &[]),
	("vse8.v", "vse8.v {}, (xreg1)", &[]),
	("vse16.v", "vse16.v {}, (xreg1)", &[]),
	("vse32.v", "vse32.v {}, (xreg1)", &[]),
	("vse64.v", "vse64.v {}, (xreg1)", &[]),
	("vlm.v", "vlm.v {}, (xreg1)", &[]),
	("vsm.v", "vsm.v {}, (xreg1)", &[]),
	("vlse8.v", "vlse8.v {}, (xreg1), xreg2", &[]),
	("vlse16.v", "vlse16.v {}, (xreg1), xreg2", &[]),
	("vlse32.v", "vlse32.v {}, (xreg1), xreg2", &[]),
	("vlse64.v", "vlse64.v {}, (xreg1), xreg2", &[]),
	("vsse8.v", "vsse8.v {}, (xreg1), xreg2", &[]),
	("vsse16.v", "vsse16.v {}, (xreg1), xreg2", &[]),
	("vsse32.v", "vsse32.v {}, (xreg1), xreg2", &[]),
	("vsse64.v", "vsse64.v {}, (xreg1), xreg2", &[]),
	("vluxei8.v", "vluxei8.v {}, (xreg1), xreg2", &[]),
	("vluxei16.v", "vluxei16.v {}, (xreg1), xreg2", &[]),
	("vluxei32.v", "vluxei32.v {}, (xreg1), xreg2", &[]),
	("vluxei64.v", "vluxei64.v {}, (xreg1), xreg2", &[]),
	("vloxei8.v", "vloxei8.v {}, (xreg1), xreg2", &[]),
	("vloxei16.v", "vloxei16.v {}, (xreg1), xreg2", &[]),
	("vloxei32.v", "vloxei32.v {}, (xreg1), xreg2", &[]),
	("vloxei64.v", "vloxei64.v {}, (xreg1), xreg2", &[]),
	("vsuxei8.v", "vsuxei8.v {}, (xreg1), xreg2", &[]),
	("vsuxei16.v", "vsuxei16.v {}, (xreg1), xreg2", &[]),
	("vsuxei32.v", "vsuxei32.v {}, (xreg1), xreg2", &[]),
	("vsuxei64.v", "vsuxei64.v {}, (xreg1), xreg2", &[]),
	("vsoxei8.v", "vsoxei8.v {}, (xreg1), xreg2", &[]),
	("vsoxei16.v", "vsoxei16.v {}, (xreg1), xreg2", &[]),
	("vsoxei32.v", "vsoxei32.v {}, (xreg1), xreg2", &[]),
	("vsoxei64.v", "vsoxei64.v {}, (xreg1), xreg2", &[]),
];

/// CSRs the general-purpose CSR expansion draws from.
pub const CSR_NAMES: &[&str] = &[
	"fflags", "frm", "fcsr", "sstatus", "sie", "sscratch", "sepc", "scause",
	"stval", "sip", "satp", "mhartid", "mstatus", "medeleg", "mie", "mscratch",
	"mepc", "mcause", "mtval", "mip", "pmpcfg0", "pmpaddr0", "pmpaddr1",
	"pmpaddr2", "pmpaddr3", "pmpaddr4", "pmpaddr5", "pmpaddr6", "pmpaddr7",
];

pub const HV_CSRS: &[&str] = &[
	// trap setup
	"hstatus", "hedeleg", "hideleg", "hie", "hcounteren", "hgeie", "hedelegh",
	// trap handling
	"htval", "hip", "hvip", "htinst", "hgeip",
	// configuration
	"henvcfg", "henvcfgh",
	// protection and translation
	"hgatp",
	// debug/trace
	"hcontext",
	// counter/timer virtualization
	"htimedelta", "htimedeltah",
	// state enable
	"hstateen0", "hstateen1", "hstateen2", "hstateen3", "hstateen0h",
	"hstateen1h", "hstateen2h", "hstateen3h",
	// virtual supervisor
	"vsstatus", "vsie", "vstvec", "vsscratch", "vsepc", "vscause", "vstval",
	"vsip", "vsatp",
];

// Vendor-defined m-mode CSRs: 0xBC2 is the bitmap/memory-tagging
// configuration register, 0xBC3 the memory-protection-table configuration.
pub const CSR_BITMAP: &[&str] = &["0xBC2"];
pub const CSR_MPT: &[&str] = &["0xBC3"];

pub const CSRS_CBO: &[&str] = &["menvcfg", "senvcfg", "henvcfg"];

pub const CSRS_VECTOR: &[&str] = &["vstart", "vxsat", "vxrm", "vl", "vtype"];

pub const COUNTER_TIMERS: &[&str] = &[
	"cycle", "time", "instret", "cycleh", "timeh", "instreth", "hpmcounter3",
	"hpmcounter4", "hpmcounter5", "hpmcounter6", "hpmcounter7", "hpmcounter8",
	"hpmcounter31", "hpmcounter3h", "hpmcounter4h", "hpmcounter31h",
];

pub const VREG_NAMES: &[&str] = &[
	"v0", "v1", "v2", "v3", "v4", "v5", "v6", "v7", "v8", "v9", "v10", "v11",
	"v12", "v13", "v14", "v15", "v16", "v17", "v18", "v19", "v20", "v21",
	"v22", "v23", "v24", "v25", "v26", "v27", "v28", "v29", "v30", "v31",
];

/// A named ISA subset of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subset {
	Rv32i,
	Rv64i,
	Zifencei,
	Zicsr,
	Rv32m,
	Rv64m,
	Rv32a,
	Rv64a,
	Rv32f,
	Rv64f,
	Rv32d,
	Rv64d,
	Rv32q,
	Rv64q,
	TrapRet,
}

impl Subset {
	/// The 64-bit counterpart a 32-bit subset is paired with under "RV64".
	fn widened(&self) -> Option<Subset> {
		match self {
			Subset::Rv32i => Some(Subset::Rv64i),
			Subset::Rv32m => Some(Subset::Rv64m),
			Subset::Rv32a => Some(Subset::Rv64a),
			Subset::Rv32f => Some(Subset::Rv64f),
			Subset::Rv32d => Some(Subset::Rv64d),
			Subset::Rv32q => Some(Subset::Rv64q),
			_ => None,
		}
	}

	fn raw_tables(&self) -> &'static [&'static [RawOp]] {
		match self {
			Subset::Rv32i => &[
				RV32I_RTYPE,
				RV32I_ITYPE,
				RV32I_BTYPE,
				RV32I_STYPE,
				RV32I_JTYPE,
				RV32I_UTYPE,
			],
			Subset::Rv64i => &[RV64I_RTYPE, RV64I_ITYPE, RV64I_STYPE],
			Subset::Zifencei => &[RV_ZIFENCEI],
			Subset::Zicsr => &[RV_ZICSR],
			Subset::Rv32m => &[RV32M],
			Subset::Rv64m => &[RV64M],
			Subset::Rv32a => &[RV32A],
			Subset::Rv64a => &[RV64A],
			Subset::Rv32f => &[RV32F],
			Subset::Rv64f => &[RV64F],
			Subset::Rv32d => &[RV32D],
			Subset::Rv64d => &[RV64D],
			Subset::Rv32q => &[RV32Q],
			Subset::Rv64q => &[RV64Q],
			Subset::TrapRet => &[TRAP_RET],
		}
	}
}

fn is_slot_token(token: &str) -> bool {
	for prefix in ["xreg", "freg", "uimm", "imm"] {
		if let Some(rest) = token.strip_prefix(prefix) {
			if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
				return true;
			}
		}
	}
	token == "symbol"
}

fn build_template(raw: &RawOp) -> OpTemplate {
	let (mnemonic, syntax, aligns) = *raw;
	let mut tpl = OpTemplate {
		mnemonic,
		syntax,
		xregs: Vec::new(),
		fregs: Vec::new(),
		imms: Vec::new(),
		symbols: Vec::new(),
	};

	// the mnemonic itself can contain dots ("amoadd.w"); skip it so its
	// pieces are never mistaken for slot tokens
	let operands = syntax.split_once(' ').map(|(_, rest)| rest).unwrap_or("");
	for token in operands.split(|c: char| !c.is_ascii_alphanumeric()) {
		if !is_slot_token(token) {
			continue;
		}
		if token.starts_with("xreg") {
			if !tpl.xregs.contains(&token) {
				tpl.xregs.push(token);
			}
		} else if token.starts_with("freg") {
			if !tpl.fregs.contains(&token) {
				tpl.fregs.push(token);
			}
		} else if token == "symbol" {
			if !tpl.symbols.contains(&token) {
				tpl.symbols.push(token);
			}
		} else if !tpl.imms.iter().any(|(name, _)| *name == token) {
			let align = aligns
				.iter()
				.find(|(name, _)| *name == token)
				.map(|(_, align)| *align)
				.unwrap_or(1);
			tpl.imms.push((token, align));
		}
	}

	for (name, _) in aligns {
		assert!(
			tpl.imms.iter().any(|(slot, _)| slot == name),
			"alignment for {} names no slot in \"{}\"",
			name,
			syntax
		);
	}

	tpl
}

fn build_tables(tables: &[&[RawOp]]) -> Vec<OpTemplate> {
	tables
		.iter()
		.flat_map(|table| table.iter().map(build_template))
		.collect()
}

lazy_static! {
	static ref SUBSETS: HashMap<Subset, Vec<OpTemplate>> = {
		let all = [
			Subset::Rv32i,
			Subset::Rv64i,
			Subset::Zifencei,
			Subset::Zicsr,
			Subset::Rv32m,
			Subset::Rv64m,
			Subset::Rv32a,
			Subset::Rv64a,
			Subset::Rv32f,
			Subset::Rv64f,
			Subset::Rv32d,
			Subset::Rv64d,
			Subset::Rv32q,
			Subset::Rv64q,
			Subset::TrapRet,
		];
		all.iter()
			.map(|sub| (*sub, build_tables(sub.raw_tables())))
			.collect()
	};
	static ref HV_OPS: Vec<OpTemplate> = build_tables(&[HYPERVISOR]);
	static ref CBO_OPS: Vec<OpTemplate> = build_tables(&[CBO]);
	static ref VECTOR_OPS: Vec<OpTemplate> = build_tables(&[VECTOR_CONFIG, VECTOR_MEM]);
}

pub fn subset_ops(subset: Subset) -> &'static [OpTemplate] {
	&SUBSETS[&subset]
}

pub fn hypervisor_ops() -> &'static [OpTemplate] {
	&HV_OPS
}

pub fn cbo_ops() -> &'static [OpTemplate] {
	&CBO_OPS
}

pub fn vector_ops() -> &'static [OpTemplate] {
	&VECTOR_OPS
}

/// Looks up an opcode in the extension tables that take priority over the
/// general catalog: hypervisor first, then cache-block, then vector.
pub fn lookup_ext(mnemonic: &str) -> Option<&'static OpTemplate> {
	HV_OPS
		.iter()
		.chain(CBO_OPS.iter())
		.chain(VECTOR_OPS.iter())
		.find(|op| op.mnemonic == mnemonic)
}

/// Expands an ISA string into the ordered list of subsets it selects.
///
/// Tokens are matched as substrings, the way the toolchain's -march strings
/// are usually probed. "G" selects {I, A, F, Zifencei, Zicsr}; "RV64" pairs
/// every 32-bit subset with its 64-bit counterpart, keeping both.
/// Trap-return opcodes are always included.
fn subsets_for(isa: &str) -> Vec<Subset> {
	let mut subsets = vec![Subset::TrapRet];

	const TOKENS: &[(&str, Subset)] = &[
		("I", Subset::Rv32i),
		("M", Subset::Rv32m),
		("A", Subset::Rv32a),
		("F", Subset::Rv32f),
		("D", Subset::Rv32d),
		("Q", Subset::Rv32q),
		("zifencei", Subset::Zifencei),
	];
	for (token, subset) in TOKENS {
		if isa.contains(token) {
			subsets.push(*subset);
		}
	}

	if isa.contains('G') {
		subsets.extend([
			Subset::Rv32i,
			Subset::Rv32a,
			Subset::Rv32f,
			Subset::Zifencei,
			Subset::Zicsr,
		]);
	}

	if isa.contains("RV64") {
		let mut extended = Vec::with_capacity(subsets.len() * 2);
		for subset in subsets {
			extended.push(subset);
			if let Some(wide) = subset.widened() {
				extended.push(wide);
			}
		}
		subsets = extended;
	}

	subsets
}

/// Resolves an ISA string to its ordered opcode template set.
///
/// Union semantics match a dict update: a mnemonic keeps the position of its
/// first appearance, later subsets overwrite its template.
pub fn resolve(isa: &str) -> Vec<&'static OpTemplate> {
	let mut order: Vec<&'static str> = Vec::new();
	let mut by_name: HashMap<&'static str, &'static OpTemplate> = HashMap::new();

	for subset in subsets_for(isa) {
		for op in subset_ops(subset) {
			if by_name.insert(op.mnemonic, op).is_none() {
				order.push(op.mnemonic);
			}
		}
	}

	order.into_iter().map(|name| by_name[name]).collect()
}

/// Whether a mnemonic belongs to any 64-bit-width subset (used to scale
/// memory-offset alignment in the atomic expansion).
pub fn is_rv64_op(mnemonic: &str) -> bool {
	const RV64_SUBSETS: &[Subset] = &[
		Subset::Rv64i,
		Subset::Rv64m,
		Subset::Rv64a,
		Subset::Rv64f,
		Subset::Rv64d,
		Subset::Rv64q,
	];
	RV64_SUBSETS
		.iter()
		.any(|sub| subset_ops(*sub).iter().any(|op| op.mnemonic == mnemonic))
}

/// Whether a mnemonic is a floating-point catalog op (F/D/Q subsets).
pub fn is_fp_op(mnemonic: &str) -> bool {
	const FP_SUBSETS: &[Subset] = &[
		Subset::Rv32f,
		Subset::Rv64f,
		Subset::Rv32d,
		Subset::Rv64d,
		Subset::Rv32q,
		Subset::Rv64q,
	];
	FP_SUBSETS
		.iter()
		.any(|sub| subset_ops(*sub).iter().any(|op| op.mnemonic == mnemonic))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn find(ops: &[&'static OpTemplate], name: &str) -> &'static OpTemplate {
		ops.iter()
			.copied()
			.find(|op| op.mnemonic == name)
			.unwrap_or_else(|| panic!("{} not resolved", name))
	}

	#[test]
	fn slot_derivation_matches_syntax() {
		let ops = resolve("RV64G");

		let lw = find(&ops, "lw");
		assert_eq!(lw.xregs, vec!["xreg0", "xreg1"]);
		assert_eq!(lw.imms, vec![("imm6", 4)]);
		assert!(lw.fregs.is_empty() && lw.symbols.is_empty());

		let beq = find(&ops, "beq");
		assert_eq!(beq.symbols, vec!["symbol"]);

		let fmadd = find(&ops, "fmadd.s");
		assert_eq!(fmadd.fregs, vec!["freg0", "freg1", "freg2", "freg3"]);
		assert!(fmadd.xregs.is_empty());

		// the CSR-name hole is not an operand slot
		let csrrw = find(&ops, "csrrw");
		assert_eq!(csrrw.xregs, vec!["xreg0", "xreg1"]);
		assert!(csrrw.imms.is_empty());
	}

	#[test]
	fn resolve_rv64g_pairs_widths() {
		let ops = resolve("RV64G");
		let names: Vec<&str> = ops.iter().map(|op| op.mnemonic).collect();

		// trap returns always present
		for ret in ["mret", "sret", "uret"] {
			assert!(names.contains(&ret), "{} missing", ret);
		}
		// 32-bit and 64-bit counterparts both selectable
		for pair in [("add", "addw"), ("lr.w", "lr.d"), ("fadd.s", "fcvt.l.s")] {
			assert!(names.contains(&pair.0), "{} missing", pair.0);
			assert!(names.contains(&pair.1), "{} missing", pair.1);
		}
		// G pulls in Zicsr
		assert!(names.contains(&"csrrwi"));
		// D/Q are not part of G
		assert!(!names.contains(&"fadd.d"));
		assert!(!names.contains(&"fadd.q"));
		// no duplicates after the union
		let mut dedup = names.clone();
		dedup.sort();
		dedup.dedup();
		assert_eq!(dedup.len(), names.len());
	}

	#[test]
	fn resolve_rv32_skips_wide_subsets() {
		let ops = resolve("RV32I");
		let names: Vec<&str> = ops.iter().map(|op| op.mnemonic).collect();
		assert!(names.contains(&"add"));
		assert!(!names.contains(&"addw"));
		assert!(!names.contains(&"ld"));
	}

	#[test]
	fn extension_tables_take_priority() {
		assert_eq!(lookup_ext("hlv.b").unwrap().syntax, "hlv.b xreg0, (xreg1)");
		assert_eq!(lookup_ext("cbo.zero").unwrap().mnemonic, "cbo.zero");
		assert_eq!(lookup_ext("vsetvli").unwrap().xregs, vec!["xreg0", "xreg1"]);
		assert!(lookup_ext("add").is_none());
	}

	#[test]
	fn width_and_fp_predicates() {
		assert!(is_rv64_op("amoswap.d"));
		assert!(!is_rv64_op("amoswap.w"));
		assert!(is_fp_op("fadd.q"));
		assert!(!is_fp_op("mul"));
	}
}
