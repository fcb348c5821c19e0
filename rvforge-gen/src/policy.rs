//
// Copyright (C) 2025 Ariel Abreu
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! Generation policies: opcode selection biases and expansion overrides that
//! steer a program toward one fault family, layered on the baseline
//! per-opcode expansions.

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::addr::AddrSynth;
use crate::csr;
use crate::isa::{
	self, OpTemplate, Subset, COUNTER_TIMERS, CSRS_CBO, CSRS_VECTOR, CSR_BITMAP, CSR_MPT,
	CSR_NAMES, HV_CSRS, VREG_NAMES,
};
use crate::word::{InstrClass, Part, SlotSet};

const ZICSR_OPS: [&str; 6] = ["csrrw", "csrrs", "csrrc", "csrrwi", "csrrsi", "csrrci"];

/// Slot names expansion handlers hand out for scratch registers.
const XREG_SLOTS: [&str; 8] = [
	"xreg0", "xreg1", "xreg2", "xreg3", "xreg4", "xreg5", "xreg6", "xreg7",
];

/// Baseline expansion family of a catalog opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expansion {
	Jal,
	Jalr,
	Branch,
	TrapRet,
	MemRead,
	MemWrite,
	Atomic,
	Csr,
	Sfence,
	Fp,
}

/// Static opcode-to-expansion mapping. Load/store float ops are claimed by
/// the memory families before the floating-point fallthrough; `fence.i`
/// deliberately maps to nothing and renders bare.
fn expansion_for(opcode: &str) -> Option<Expansion> {
	match opcode {
		"jal" => Some(Expansion::Jal),
		"jalr" => Some(Expansion::Jalr),
		"beq" | "bne" | "blt" | "bge" | "bltu" | "bgeu" => Some(Expansion::Branch),
		"mret" | "sret" | "uret" => Some(Expansion::TrapRet),
		"lb" | "lh" | "lw" | "ld" | "lbu" | "lhu" | "lwu" | "flw" | "fld" | "flq" => {
			Some(Expansion::MemRead)
		}
		"sb" | "sh" | "sw" | "sd" | "fsw" | "fsd" | "fsq" => Some(Expansion::MemWrite),
		_ if opcode.starts_with("lr.") || opcode.starts_with("sc.") || opcode.starts_with("amo") => {
			Some(Expansion::Atomic)
		}
		_ if ZICSR_OPS.contains(&opcode) => Some(Expansion::Csr),
		"sfence.vma" => Some(Expansion::Sfence),
		_ if isa::is_fp_op(opcode) => Some(Expansion::Fp),
		_ => None,
	}
}

/// One time in ten, memory accesses get their base flipped into the high
/// half of the address space.
fn upper_mask<R: Rng>(rng: &mut R, slots: &mut SlotSet) -> Vec<String> {
	if rng.gen::<f64>() < 0.1 {
		slots.xregs.push("xreg2");
		vec![
			"lui xreg2, 0xffe00".to_string(),
			"xor xreg1, xreg1, xreg2".to_string(),
		]
	} else {
		Vec::new()
	}
}

/// Baseline expansion of an opcode into its instruction sequence and class.
fn base_expand<R: Rng>(
	rng: &mut R,
	opcode: &str,
	syntax: &str,
	slots: &mut SlotSet,
) -> (InstrClass, Vec<String>) {
	match expansion_for(opcode) {
		Some(Expansion::Jal) => (InstrClass::Jump, vec![syntax.to_string()]),
		Some(Expansion::Jalr) => {
			slots.symbols.push("symbol");
			(
				InstrClass::Jump,
				vec!["la xreg1, symbol".to_string(), syntax.to_string()],
			)
		}
		Some(Expansion::Branch) => (InstrClass::Branch, vec![syntax.to_string()]),
		Some(Expansion::TrapRet) => {
			slots.xregs.push("xreg0");
			slots.symbols.push("symbol");
			// land the return at a forward label via the matching epc
			let insts = vec![
				"la xreg0, symbol".to_string(),
				format!("csrrw zero, {}epc, xreg0", &opcode[..1]),
				syntax.to_string(),
			];
			(InstrClass::Return, insts)
		}
		Some(Expansion::MemRead) | Some(Expansion::MemWrite) => {
			let class = if expansion_for(opcode) == Some(Expansion::MemRead) {
				InstrClass::MemRead
			} else {
				InstrClass::MemWrite
			};
			slots.symbols.push("symbol");
			let mut insts = vec!["la xreg1, symbol".to_string()];
			insts.extend(upper_mask(rng, slots));
			insts.push(syntax.to_string());
			(class, insts)
		}
		Some(Expansion::Atomic) => {
			slots.symbols.push("symbol");
			let align = if isa::is_rv64_op(opcode) { 8 } else { 4 };
			slots.imms.push(("imm6", align));
			let mut insts = vec![
				"la xreg1, symbol".to_string(),
				"addi xreg1, xreg1, imm6".to_string(),
			];
			insts.extend(upper_mask(rng, slots));
			insts.push(syntax.to_string());
			(InstrClass::MemWrite, insts)
		}
		Some(Expansion::Csr) => csr::csr_access_word(rng, opcode, syntax, slots, CSR_NAMES),
		Some(Expansion::Sfence) => (InstrClass::None, vec![syntax.to_string()]),
		Some(Expansion::Fp) => (
			InstrClass::None,
			vec![syntax.replacen("{}", "rne", 1)],
		),
		None => (InstrClass::None, vec![syntax.to_string()]),
	}
}

fn zicsr_mnemonics() -> Vec<&'static str> {
	isa::subset_ops(Subset::Zicsr)
		.iter()
		.map(|op| op.mnemonic)
		.collect()
}

/// Three random general CSRs plus a policy's focus CSRs.
fn csr_pool<R: Rng>(rng: &mut R, focus: &[&'static str]) -> Vec<&'static str> {
	let mut pool: Vec<&'static str> = CSR_NAMES.choose_multiple(rng, 3).copied().collect();
	pool.extend_from_slice(focus);
	pool
}

fn base_select<R: Rng>(rng: &mut R, ops: &[&'static OpTemplate], part: Part) -> &'static str {
	if part == Part::Prefix {
		// prefix words only touch CSRs, setting machine state up
		isa::subset_ops(Subset::Zicsr).choose(rng).unwrap().mnemonic
	} else {
		ops.choose(rng).unwrap().mnemonic
	}
}

/// A generation policy. `RandomInst` is the unbiased baseline; every other
/// variant skews selection and expansion toward one stress family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
	RandomInst,
	IllLow2high,
	M2SLegalSwitch,
	S2ULegalSwitch,
	RandSwitch,
	Interrupt,
	Exception,
	CounterTimer,
	Hypervisor,
	Bitmap,
	Mpt,
	Cbo,
	Vector,
}

impl Policy {
	pub const ALL: [Policy; 13] = [
		Policy::RandomInst,
		Policy::IllLow2high,
		Policy::M2SLegalSwitch,
		Policy::S2ULegalSwitch,
		Policy::RandSwitch,
		Policy::Interrupt,
		Policy::Exception,
		Policy::CounterTimer,
		Policy::Hypervisor,
		Policy::Bitmap,
		Policy::Mpt,
		Policy::Cbo,
		Policy::Vector,
	];

	/// IDs of the program templates this policy's output can be embedded in.
	pub fn templates(&self) -> &'static [u32] {
		match self {
			Policy::RandomInst
			| Policy::RandSwitch
			| Policy::Interrupt
			| Policy::Exception
			| Policy::CounterTimer => &[0, 1, 2],
			Policy::IllLow2high => &[2],
			Policy::M2SLegalSwitch => &[0],
			Policy::S2ULegalSwitch => &[1],
			Policy::Hypervisor => &[3],
			Policy::Bitmap | Policy::Mpt => &[4],
			Policy::Cbo | Policy::Vector => &[0],
		}
	}

	pub(crate) fn select_opcode<R: Rng>(
		&self,
		rng: &mut R,
		ops: &[&'static OpTemplate],
		part: Part,
	) -> &'static str {
		let body = part != Part::Prefix;
		match self {
			Policy::IllLow2high if body && rng.gen::<f64>() < 0.4 => {
				let dice = rng.gen_range(0..100);
				if dice < 20 {
					*["sret", "mret", "sfence.vma", "csrrw"].choose(rng).unwrap()
				} else if dice < 30 {
					"ecall"
				} else {
					*["csrrs", "csrrc", "csrrw"].choose(rng).unwrap()
				}
			}
			Policy::M2SLegalSwitch if part == Part::Main && rng.gen::<f64>() < 0.3 => "csrrw",
			Policy::S2ULegalSwitch if part == Part::Main && rng.gen::<f64>() < 0.2 => "csrrw",
			Policy::RandSwitch if body && rng.gen::<f64>() < 0.2 => {
				let mut pool = zicsr_mnemonics();
				pool.extend(["fence.i", "sfence.vma"]);
				pool.extend(["fence", "ecall", "ebreak", "mret", "sret"]);
				*pool.choose(rng).unwrap()
			}
			Policy::Interrupt if part == Part::Main && rng.gen::<f64>() < 0.3 => "csrrs",
			Policy::Exception if body && rng.gen::<f64>() < 0.2 => {
				static FAULT_OPS: [&str; 5] = ["jalr", "ebreak", "lw", "sw", "ecall"];
				static FAULT_WEIGHTS: [u32; 5] = [1, 2, 10, 10, 2];
				let idx = WeightedIndex::new(FAULT_WEIGHTS).unwrap().sample(rng);
				FAULT_OPS[idx]
			}
			Policy::CounterTimer if body && rng.gen::<f64>() < 0.3 => {
				*["csrrw", "csrrs", "csrrc"].choose(rng).unwrap()
			}
			Policy::Hypervisor if body && rng.gen::<f64>() < 0.7 => {
				let mut pool = zicsr_mnemonics();
				pool.extend(isa::hypervisor_ops().iter().map(|op| op.mnemonic));
				pool.extend(isa::RV32I_STYPE.iter().map(|raw| raw.0));
				pool.extend(isa::RV32I_ITYPE.iter().map(|raw| raw.0));
				pool.extend(isa::RV32I_JTYPE.iter().map(|raw| raw.0));
				*pool.choose(rng).unwrap()
			}
			Policy::Bitmap | Policy::Mpt if body && rng.gen::<f64>() < 0.7 => {
				let mut pool = zicsr_mnemonics();
				pool.extend(isa::RV32I_STYPE.iter().map(|raw| raw.0));
				pool.extend(isa::RV32I_ITYPE.iter().map(|raw| raw.0));
				*pool.choose(rng).unwrap()
			}
			Policy::Cbo if body && rng.gen::<f64>() < 0.5 => {
				isa::cbo_ops().choose(rng).unwrap().mnemonic
			}
			Policy::Vector if part == Part::Prefix => "vsetvli",
			Policy::Vector if rng.gen::<f64>() < 0.5 => {
				isa::vector_ops().choose(rng).unwrap().mnemonic
			}
			_ => base_select(rng, ops, part),
		}
	}

	pub(crate) fn expand<R: Rng>(
		&self,
		rng: &mut R,
		addr: &mut AddrSynth,
		opcode: &str,
		syntax: &str,
		slots: &mut SlotSet,
	) -> (InstrClass, Vec<String>) {
		match self {
			Policy::IllLow2high if csr::REGISTER_FORM.contains(&opcode) => {
				ill_csr_read(rng, syntax, slots)
			}
			Policy::M2SLegalSwitch if opcode == "csrrw" => m2s_switch(rng, syntax, slots),
			Policy::S2ULegalSwitch if opcode == "csrrw" => s2u_switch(rng, syntax, slots),
			Policy::Interrupt if opcode == "csrrs" => interrupt_raise(rng, syntax),
			Policy::Exception => exception_expand(rng, addr, opcode, syntax, slots),
			Policy::CounterTimer if csr::REGISTER_FORM.contains(&opcode) => {
				counter_probe(rng, syntax)
			}
			Policy::Hypervisor => match opcode {
				"sfence.vma" => paged_sfence(slots, syntax),
				_ if ZICSR_OPS.contains(&opcode) => {
					let mut pool: Vec<&str> = CSR_NAMES.to_vec();
					pool.extend_from_slice(HV_CSRS);
					csr::csr_access_word(rng, opcode, syntax, slots, &pool)
				}
				_ => base_expand(rng, opcode, syntax, slots),
			},
			Policy::Bitmap => match opcode {
				"sfence.vma" => paged_sfence(slots, syntax),
				_ if ZICSR_OPS.contains(&opcode) => {
					let pool = csr_pool(rng, CSR_BITMAP);
					csr::csr_access_word(rng, opcode, syntax, slots, &pool)
				}
				"lw" | "sw" => raw_addr_access(rng, addr, opcode, syntax, false),
				_ => base_expand(rng, opcode, syntax, slots),
			},
			Policy::Mpt => match opcode {
				"sfence.vma" => paged_sfence(slots, syntax),
				"jalr" => {
					let target = addr.jump_addr(rng);
					(
						InstrClass::Jump,
						vec![format!("li xreg1, {:#x}", target), syntax.to_string()],
					)
				}
				_ if ZICSR_OPS.contains(&opcode) => {
					let pool = csr_pool(rng, CSR_MPT);
					csr::csr_access_word(rng, opcode, syntax, slots, &pool)
				}
				_ if MPT_MEM_OPS.contains(&opcode) => {
					raw_addr_access(rng, addr, opcode, syntax, true)
				}
				_ => base_expand(rng, opcode, syntax, slots),
			},
			Policy::Cbo => match opcode {
				"cbo.clean" | "cbo.flush" | "cbo.inval" | "cbo.zero" | "prefetch.r"
				| "prefetch.w" => {
					let target = addr.mem_addr(rng);
					(
						InstrClass::MemRead,
						vec![format!("li xreg1, {:#x}", target), syntax.to_string()],
					)
				}
				"prefetch.i" => {
					let target = addr.jump_addr(rng);
					(
						InstrClass::Jump,
						vec![format!("li xreg1, {:#x}", target), syntax.to_string()],
					)
				}
				_ if ZICSR_OPS.contains(&opcode) => {
					let pool = csr_pool(rng, CSRS_CBO);
					csr::csr_access_word(rng, opcode, syntax, slots, &pool)
				}
				_ => base_expand(rng, opcode, syntax, slots),
			},
			Policy::Vector => match opcode {
				"vsetvli" => {
					let mut vtypei =
						(*["e8", "e16", "e32", "e64"].choose(rng).unwrap()).to_string();
					if rng.gen::<f64>() < 0.5 {
						let lmul = ["m1", "m2", "m4", "m8", "mf8", "mf4", "mf2"]
							.choose(rng)
							.unwrap();
						vtypei.push_str(", ");
						vtypei.push_str(lmul);
					}
					vtypei.push_str(", ta, ma");
					(InstrClass::None, vec![syntax.replacen("{}", &vtypei, 1)])
				}
				_ if ZICSR_OPS.contains(&opcode) => {
					let pool = csr_pool(rng, CSRS_VECTOR);
					csr::csr_access_word(rng, opcode, syntax, slots, &pool)
				}
				_ if opcode.starts_with('v') && syntax.contains("{}") => {
					let vreg = VREG_NAMES.choose(rng).unwrap();
					(InstrClass::None, vec![syntax.replacen("{}", vreg, 1)])
				}
				_ => base_expand(rng, opcode, syntax, slots),
			},
			_ => base_expand(rng, opcode, syntax, slots),
		}
	}
}

const MPT_MEM_OPS: [&str; 17] = [
	"lw", "sw", "lb", "lh", "ld", "lbu", "lhu", "lwu", "flw", "fld", "flq", "sb", "sh", "sd",
	"fsw", "fsd", "fsq",
];

/// Builds a doctored value bit by bit in a scratch register, then writes it
/// into a privileged CSR. Run under a low-privilege template this is the
/// illegal-access probe.
fn ill_csr_read<R: Rng>(rng: &mut R, syntax: &str, slots: &mut SlotSet) -> (InstrClass, Vec<String>) {
	let csr = *["sstatus", "mstatus", "sepc", "mepc"].choose(rng).unwrap();
	let mut insts = vec!["xor xreg1, xreg1, xreg1".to_string()];
	for i in 0..rng.gen_range(0..=3usize) {
		let scratch = XREG_SLOTS[i + 2];
		slots.xregs.push(scratch);
		let bit = *[1u64, 3].choose(rng).unwrap();
		insts.push(format!("addi {}, zero, {}", scratch, bit));
		insts.push(format!("slli {}, {}, {}", scratch, scratch, rng.gen_range(0..=31)));
		insts.push(format!("add xreg1, xreg1, {}", scratch));
	}
	insts.push(syntax.replacen("{}", csr, 1));
	(InstrClass::Csr, insts)
}

/// Stages an mret into supervisor mode: either points mepc just past the
/// return, or rewrites mstatus.MPP to S before returning.
fn m2s_switch<R: Rng>(rng: &mut R, syntax: &str, slots: &mut SlotSet) -> (InstrClass, Vec<String>) {
	let csr = *["mepc", "mstatus"].choose(rng).unwrap();
	let mut insts = if csr == "mepc" {
		vec![
			"auipc xreg1, 0".to_string(),
			"addi xreg1, xreg1, 16".to_string(),
		]
	} else {
		let scratch = XREG_SLOTS[rng.gen_range(0..=3usize) + 3];
		slots.xregs.push(scratch);
		vec![
			"csrr xreg1, mstatus".to_string(),
			// clear MPP, then set it to S
			format!("li {}, -6145", scratch),
			format!("and xreg1, xreg1, {}", scratch),
			"ori xreg1, xreg1, -2048".to_string(),
		]
	};
	insts.push(syntax.replacen("{}", csr, 1));
	insts.push("mret".to_string());
	(InstrClass::Csr, insts)
}

/// Stages an sret into user mode by the same two routes via sepc/sstatus.
fn s2u_switch<R: Rng>(rng: &mut R, syntax: &str, slots: &mut SlotSet) -> (InstrClass, Vec<String>) {
	let csr = *["sepc", "sstatus"].choose(rng).unwrap();
	if csr == "sepc" {
		let insts = vec![
			"auipc xreg1, 0".to_string(),
			"addi xreg1, xreg1, 16".to_string(),
			syntax.replacen("{}", csr, 1),
		];
		return (InstrClass::Csr, insts);
	}
	let scratch = XREG_SLOTS[rng.gen_range(0..=3usize) + 3];
	slots.xregs.push(scratch);
	let insts = vec![
		"csrr xreg1, sstatus".to_string(),
		// clear SPP
		format!("li {}, -769", scratch),
		format!("and xreg1, xreg1, {}", scratch),
		syntax.replacen("{}", csr, 1),
		"sret".to_string(),
	];
	(InstrClass::Csr, insts)
}

/// Raises one pending interrupt bit, then flips enable bits through mie.
fn interrupt_raise<R: Rng>(rng: &mut R, syntax: &str) -> (InstrClass, Vec<String>) {
	let insts = vec![
		format!("li xreg1, {}", 1u64 << rng.gen_range(0..=16)),
		"csrs mip, xreg1".to_string(),
		syntax.replacen("{}", "mie", 1),
	];
	(InstrClass::Csr, insts)
}

/// Hammers a counter or timer CSR: a burst of repeated accesses, or a read
/// of `time` nudged by a near-boundary delta.
fn counter_probe<R: Rng>(rng: &mut R, syntax: &str) -> (InstrClass, Vec<String>) {
	let mut pool: Vec<&str> = COUNTER_TIMERS.to_vec();
	pool.extend_from_slice(CSR_NAMES);
	let reg = *pool.choose(rng).unwrap();

	let mut insts = if reg == "time" {
		let delta = *[1i64, 2, 0x100, -2048, 2047, -1, 0x80].choose(rng).unwrap();
		vec![
			"csrr xreg1, time".to_string(),
			format!("addi xreg1, xreg1, {}", delta),
		]
	} else {
		let access = syntax.replacen("{}", reg, 1);
		vec![access; rng.gen_range(0..=10)]
	};
	insts.push(syntax.replacen("{}", reg, 1));
	(InstrClass::Csr, insts)
}

/// sfence.vma with a synthesized asid/address pair instead of bare regs.
fn paged_sfence(slots: &mut SlotSet, syntax: &str) -> (InstrClass, Vec<String>) {
	slots.imms.push(("uimm1", 1));
	slots.imms.push(("uimm6", 8));
	let insts = vec![
		"li xreg0, uimm1".to_string(),
		"addi xreg1, xreg0, uimm6".to_string(),
		syntax.to_string(),
	];
	(InstrClass::None, insts)
}

/// Memory access at a raw synthesized address rather than a data symbol.
/// `force_offset` pushes the address onto a page tail 30% of the time.
fn raw_addr_access<R: Rng>(
	rng: &mut R,
	addr: &mut AddrSynth,
	opcode: &str,
	syntax: &str,
	force_offset: bool,
) -> (InstrClass, Vec<String>) {
	let mut target = addr.mem_addr(rng);
	if force_offset && rng.gen::<f64>() < 0.3 {
		target |= 0xFFF;
	}
	let class = if opcode.starts_with('s') || opcode.starts_with("fs") {
		InstrClass::MemWrite
	} else {
		InstrClass::MemRead
	};
	(
		class,
		vec![format!("li xreg1, {:#x}", target), syntax.to_string()],
	)
}

/// Exception-policy expansion: faulting jumps, raw-address accesses, ecalls
/// with a doctored mstatus, and rare garbage-word injection.
fn exception_expand<R: Rng>(
	rng: &mut R,
	addr: &mut AddrSynth,
	opcode: &str,
	syntax: &str,
	slots: &mut SlotSet,
) -> (InstrClass, Vec<String>) {
	let (class, mut insts) = match opcode {
		"jalr" => {
			let target = addr.jump_addr(rng);
			(
				InstrClass::Jump,
				vec![format!("li xreg1, {:#x}", target), syntax.to_string()],
			)
		}
		"lw" | "sw" => raw_addr_access(rng, addr, opcode, syntax, false),
		"ecall" => {
			if rng.gen::<f64>() < 0.7 {
				slots.xregs.push("xreg0");
				let mpp = *[0x800u64, 0].choose(rng).unwrap();
				(
					InstrClass::None,
					vec![
						format!("li xreg0, {:#x}", mpp),
						"csrw mstatus, xreg0".to_string(),
						syntax.to_string(),
					],
				)
			} else {
				(InstrClass::None, vec![syntax.to_string()])
			}
		}
		_ => base_expand(rng, opcode, syntax, slots),
	};

	if rng.gen::<f64>() < 0.05 && insts.len() > 2 {
		let at = rng.gen_range(0..=insts.len());
		insts.insert(at, format!(".word 0x{:X}", rng.gen_range(0..=0xFFFFu32)));
	}

	(class, insts)
}
