//
// Copyright (C) 2025 Ariel Abreu
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! The program generator: owns the RNG, the resolved opcode catalog, and the
//! per-program operand state, and drives word creation and population.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::addr::AddrSynth;
use crate::isa::{self, OpTemplate};
use crate::operand::{self, Context};
use crate::policy::Policy;
use crate::word::{InstrClass, Part, SlotSet, Word};

pub struct Generator {
	policy: Policy,
	opcodes: Vec<&'static OpTemplate>,
	ctx: Context,
	addr: AddrSynth,
	rng: StdRng,
}

/// Register band an operand draw may use: the prefix runs on the setup
/// registers x10..x14 so it never clobbers template bookkeeping state.
fn band_for(part: Part) -> (u32, u32) {
	if part == Part::Prefix {
		(10, 15)
	} else {
		(0, 31)
	}
}

impl Generator {
	pub fn new(isa: &str, policy: Policy) -> Self {
		Self::with_rng(isa, policy, StdRng::from_entropy())
	}

	/// Seeded construction; equal seeds give equal programs.
	pub fn with_seed(isa: &str, policy: Policy, seed: u64) -> Self {
		Self::with_rng(isa, policy, StdRng::seed_from_u64(seed))
	}

	fn with_rng(isa: &str, policy: Policy, mut rng: StdRng) -> Self {
		let opcodes = isa::resolve(isa);
		assert!(!opcodes.is_empty(), "ISA string {:?} selects no opcodes", isa);
		let addr = AddrSynth::new(&mut rng);
		Generator {
			policy,
			opcodes,
			ctx: Context::new(),
			addr,
			rng,
		}
	}

	pub fn policy(&self) -> Policy {
		self.policy
	}

	/// Clears per-program state for the next program. The RNG stream keeps
	/// advancing; the address bases are re-rolled.
	pub fn reset(&mut self) {
		self.ctx.reset();
		self.addr.reseed(&mut self.rng);
	}

	/// Creates the next word for `part`: picks an opcode under the policy,
	/// expands it, and assigns the part's next label. The word still has
	/// unresolved operand slots.
	pub fn get_word(&mut self, part: Part) -> Word {
		let label = self.ctx.next_label(part);
		let opcode = self.policy.select_opcode(&mut self.rng, &self.opcodes, part);

		// extension tables shadow the general catalog; prefix selection
		// always draws CSR setup ops, whether or not the ISA string pulled
		// Zicsr into the catalog
		let template = isa::lookup_ext(opcode)
			.or_else(|| {
				self.opcodes
					.iter()
					.find(|op| op.mnemonic == opcode)
					.copied()
			})
			.or_else(|| {
				isa::subset_ops(isa::Subset::Zicsr)
					.iter()
					.find(|op| op.mnemonic == opcode)
			})
			.unwrap_or_else(|| panic!("opcode {} has no template", opcode));

		let mut slots = SlotSet::from_template(template);
		let (class, insts) =
			self.policy
				.expand(&mut self.rng, &mut self.addr, opcode, template.syntax, &mut slots);
		Word::new(label, class, insts, slots)
	}

	/// Fills every operand slot of `word` with a synthesized value and
	/// freezes it. Idempotent, like `Word::populate`.
	pub fn populate_word(&mut self, word: &mut Word, max_label: u32, part: Part) {
		if word.is_populated() {
			return;
		}
		let band = band_for(part);
		let no_zero = word.class() != InstrClass::None;
		let slots = word.slots().clone();

		let mut opvals: HashMap<&'static str, String> = HashMap::new();
		for &name in &slots.xregs {
			let value = self.ctx.xreg(&mut self.rng, band, no_zero);
			opvals.insert(name, value);
		}
		for &name in &slots.fregs {
			let value = self.ctx.freg(&mut self.rng);
			opvals.insert(name, value);
		}
		for &(name, align) in &slots.imms {
			let value = self.ctx.imm(&mut self.rng, &mut self.addr, name, align);
			opvals.insert(name, value);
		}
		for &name in &slots.symbols {
			let value = operand::symbol(&mut self.rng, word.class(), word.label(), max_label, part);
			opvals.insert(name, value);
		}

		word.populate(&opvals, part);
	}
}
