//
// Copyright (C) 2025 Ariel Abreu
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! Per-program operand state and value synthesis: registers with reuse bias,
//! width-masked immediates seeded from boundary constants, and code/data
//! symbol selection.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::addr::AddrSynth;
use crate::word::{InstrClass, Part};

/// Boundary and pattern constants an immediate draw can start from, before
/// the fresh memory and jump addresses are appended.
const INTERESTING_SEEDS: [u64; 31] = [
	0x0,
	0x1,
	0x2,
	0x3,
	0x4,
	0x8,
	0x0F,
	0x10,
	0x1F,
	0x7F,
	0x300,
	0x305,
	0x7FF,
	0x555,
	0xAAA,
	0x800,
	0xFFF,
	0xFFE,
	0xFFC,
	0x1000,
	0x7_FFFF,
	0xF_FE00,
	0x1234_5678,
	0x7FFF_FFFF,
	0x7F80_0000,
	0xFF80_0000,
	0x7FC0_0000,
	0x7F7F_FFFF,
	0x8000_0000,
	0xFFFF_FFFF,
	0xFFF8_0000,
];

const REUSE_THRES: f64 = 0.2;
const INTERESTING_THRES: f64 = 0.3;
// probability that an immediate is forced onto its natural alignment
const ALIGN_THRES: f64 = 1.0;

/// Draws one value from the interesting pool. Both address synthesizers run
/// on every draw so their sticky bases keep evolving even when an address is
/// not the value picked.
pub(crate) fn interesting_int<R: Rng>(rng: &mut R, addr: &mut AddrSynth) -> u64 {
	let mem = addr.mem_addr(rng);
	let jump = addr.jump_addr(rng);
	let idx = rng.gen_range(0..INTERESTING_SEEDS.len() + 2);
	match idx {
		i if i < INTERESTING_SEEDS.len() => INTERESTING_SEEDS[i],
		i if i == INTERESTING_SEEDS.len() => mem,
		_ => jump,
	}
}

/// Mutable operand state for one synthesized program: label counters per
/// part, and the used-value pools that reuse bias draws from. Owned by the
/// caller and reset between programs.
#[derive(Debug, Default)]
pub struct Context {
	prefix_labels: u32,
	main_labels: u32,
	suffix_labels: u32,
	used_xregs: Vec<u32>,
	used_fregs: Vec<u32>,
	used_imms: Vec<u64>,
}

impl Context {
	pub fn new() -> Self {
		Context::default()
	}

	pub fn reset(&mut self) {
		*self = Context::default();
	}

	/// Hands out the next label number for a part.
	pub fn next_label(&mut self, part: Part) -> u32 {
		let counter = match part {
			Part::Prefix => &mut self.prefix_labels,
			Part::Main => &mut self.main_labels,
			Part::Suffix => &mut self.suffix_labels,
		};
		let label = *counter;
		*counter += 1;
		label
	}

	/// Picks an integer register from `band` (half-open), reusing an earlier
	/// pick 20% of the time when drawing from the full band. `no_zero`
	/// redraws x0 into x1..=x31.
	pub fn xreg<R: Rng>(&mut self, rng: &mut R, band: (u32, u32), no_zero: bool) -> String {
		let full_band = band == (0, 31);
		let mut num = if full_band && !self.used_xregs.is_empty() && rng.gen::<f64>() < REUSE_THRES
		{
			*self.used_xregs.choose(rng).unwrap()
		} else {
			let fresh = rng.gen_range(band.0..band.1);
			if !self.used_xregs.contains(&fresh) {
				self.used_xregs.push(fresh);
			}
			fresh
		};
		if no_zero && num == 0 {
			num = rng.gen_range(1..32);
		}
		format!("x{}", num)
	}

	/// Picks a floating-point register with the same reuse bias.
	pub fn freg<R: Rng>(&mut self, rng: &mut R) -> String {
		let num = if !self.used_fregs.is_empty() && rng.gen::<f64>() < REUSE_THRES {
			*self.used_fregs.choose(rng).unwrap()
		} else {
			let fresh = rng.gen_range(0..32);
			if !self.used_fregs.contains(&fresh) {
				self.used_fregs.push(fresh);
			}
			fresh
		};
		format!("f{}", num)
	}

	/// Synthesizes an immediate for a slot named `immW` or `uimmW`, where W
	/// is the field width in bits (signed slots spend one bit on the sign,
	/// drawn as a separate random minus). The value is masked to the field
	/// and to the slot's alignment, and one random draw routes it between
	/// reuse, the interesting pool, and a uniform draw.
	pub fn imm<R: Rng>(
		&mut self,
		rng: &mut R,
		addr: &mut AddrSynth,
		name: &str,
		align: u64,
	) -> String {
		assert!(align.is_power_of_two(), "imm alignment {} is not a power of 2", align);

		let (unsigned, digits) = match name.strip_prefix("uimm") {
			Some(rest) => (true, rest),
			None => (false, name.strip_prefix("imm").unwrap_or(name)),
		};
		let field_width: u32 = digits
			.parse()
			.unwrap_or_else(|_| panic!("malformed immediate slot name {}", name));
		let width = if unsigned { field_width } else { field_width - 1 };

		let sign = if !unsigned && rng.gen::<f64>() < 0.5 { "-" } else { "" };

		let mut mask = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
		if rng.gen::<f64>() < ALIGN_THRES {
			mask &= !(align - 1);
		}

		let roll: f64 = rng.gen();
		let value = if !self.used_imms.is_empty() && roll < REUSE_THRES {
			*self.used_imms.choose(rng).unwrap()
		} else if roll < REUSE_THRES + INTERESTING_THRES {
			let value = interesting_int(rng, addr);
			self.used_imms.push(value);
			value
		} else {
			let value = rng.gen_range(0..=mask);
			self.used_imms.push(value);
			value
		};

		format!("{}{}", sign, mask & value)
	}
}

/// Picks a symbol for a word by class. Writes always target scratch data;
/// reads mostly target data but occasionally alias a code label anywhere in
/// the part; everything else is a code label strictly after `current`, which
/// keeps jumps, branches and returns pointed forward.
pub fn symbol<R: Rng>(
	rng: &mut R,
	class: InstrClass,
	current: u32,
	max_label: u32,
	part: Part,
) -> String {
	let data = |rng: &mut R| format!("d_{}_{}", rng.gen_range(0..=5), rng.gen_range(0..=27));
	match class {
		InstrClass::MemWrite => data(rng),
		InstrClass::MemRead => {
			if rng.gen::<f64>() < 0.2 {
				format!("{}{}", part.label_prefix(), rng.gen_range(0..=max_label))
			} else {
				data(rng)
			}
		}
		_ => format!("{}{}", part.label_prefix(), rng.gen_range(current + 1..=max_label)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::rngs::StdRng;
	use rand::SeedableRng;

	fn rng(seed: u64) -> StdRng {
		StdRng::seed_from_u64(seed)
	}

	fn parse_imm(text: &str) -> i64 {
		text.parse().expect("immediate parses as an integer")
	}

	#[test]
	fn labels_count_per_part() {
		let mut ctx = Context::new();
		assert_eq!(ctx.next_label(Part::Main), 0);
		assert_eq!(ctx.next_label(Part::Main), 1);
		assert_eq!(ctx.next_label(Part::Prefix), 0);
		assert_eq!(ctx.next_label(Part::Suffix), 0);
		assert_eq!(ctx.next_label(Part::Main), 2);
		ctx.reset();
		assert_eq!(ctx.next_label(Part::Main), 0);
	}

	#[test]
	fn prefix_band_stays_in_setup_registers() {
		let mut ctx = Context::new();
		let mut rng = rng(1);
		for _ in 0..200 {
			let reg = ctx.xreg(&mut rng, (10, 15), true);
			let num: u32 = reg[1..].parse().unwrap();
			assert!((10..15).contains(&num), "{} out of band", reg);
		}
	}

	#[test]
	fn no_zero_never_yields_x0() {
		let mut ctx = Context::new();
		let mut rng = rng(2);
		for _ in 0..500 {
			assert_ne!(ctx.xreg(&mut rng, (0, 31), true), "x0");
		}
	}

	#[test]
	fn full_band_reuses_registers() {
		let mut ctx = Context::new();
		let mut rng = rng(3);
		let picks: Vec<String> = (0..300).map(|_| ctx.xreg(&mut rng, (0, 31), false)).collect();
		let mut distinct = picks.clone();
		distinct.sort();
		distinct.dedup();
		// the band only holds 31 registers; reuse keeps the pool tight
		assert!(distinct.len() <= 31);
		assert!(distinct.len() > 10);
	}

	#[test]
	fn imm_respects_width_and_alignment() {
		let mut ctx = Context::new();
		let mut rng = rng(4);
		let mut addr = AddrSynth::new(&mut rng);
		for _ in 0..300 {
			let value = parse_imm(&ctx.imm(&mut rng, &mut addr, "imm12", 4));
			assert_eq!(value % 4, 0, "{} not 4-aligned", value);
			assert!(value.abs() < 1 << 11, "{} exceeds signed 12 bits", value);
		}
	}

	#[test]
	fn uimm_is_never_negative() {
		let mut ctx = Context::new();
		let mut rng = rng(5);
		let mut addr = AddrSynth::new(&mut rng);
		for _ in 0..300 {
			let value = parse_imm(&ctx.imm(&mut rng, &mut addr, "uimm5", 1));
			assert!((0..32).contains(&value), "{} exceeds 5 bits", value);
		}
	}

	#[test]
	#[should_panic(expected = "not a power of 2")]
	fn imm_rejects_bad_alignment() {
		let mut ctx = Context::new();
		let mut rng = rng(6);
		let mut addr = AddrSynth::new(&mut rng);
		ctx.imm(&mut rng, &mut addr, "imm12", 6);
	}

	#[test]
	fn control_flow_symbols_point_forward() {
		let mut rng = rng(7);
		for class in [InstrClass::Jump, InstrClass::Branch, InstrClass::Return] {
			for _ in 0..200 {
				let sym = symbol(&mut rng, class, 5, 10, Part::Main);
				let target: u32 = sym.strip_prefix("_l").unwrap().parse().unwrap();
				assert!(target > 5 && target <= 10, "{} not forward of 5", sym);
			}
		}
	}

	#[test]
	fn jump_at_last_label_targets_part_end() {
		let mut rng = rng(8);
		for _ in 0..50 {
			assert_eq!(symbol(&mut rng, InstrClass::Jump, 9, 10, Part::Main), "_l10");
		}
	}

	#[test]
	fn write_symbols_are_data_slots() {
		let mut rng = rng(9);
		for _ in 0..200 {
			let sym = symbol(&mut rng, InstrClass::MemWrite, 0, 10, Part::Main);
			let mut pieces = sym.split('_');
			assert_eq!(pieces.next(), Some("d"));
			let bank: u32 = pieces.next().unwrap().parse().unwrap();
			let slot: u32 = pieces.next().unwrap().parse().unwrap();
			assert!(bank <= 5 && slot <= 27);
		}
	}

	#[test]
	fn read_symbols_mix_data_and_code() {
		let mut rng = rng(10);
		let mut data = 0;
		let mut code = 0;
		for _ in 0..1000 {
			let sym = symbol(&mut rng, InstrClass::MemRead, 3, 10, Part::Suffix);
			if sym.starts_with("d_") {
				data += 1;
			} else {
				assert!(sym.starts_with("_s"));
				code += 1;
			}
		}
		assert!(code > 100 && data > 600, "code {} data {}", code, data);
	}
}
