//
// Copyright (C) 2025 Ariel Abreu
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! End-to-end checks over fully generated programs: formatting, label
//! ordering, placeholder elimination, and target remapping across a
//! relocation, for every policy.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;

use rvforge_gen::{Generator, InstrClass, Part, Policy, Word};

const WORDS: u32 = 120;

fn generate(policy: Policy, seed: u64) -> Vec<Word> {
	let mut gen = Generator::with_seed("RV64G", policy, seed);
	(0..WORDS)
		.map(|_| {
			let mut word = gen.get_word(Part::Main);
			gen.populate_word(&mut word, WORDS, Part::Main);
			word
		})
		.collect()
}

#[test]
fn every_policy_renders_complete_programs() {
	for (i, policy) in Policy::ALL.into_iter().enumerate() {
		let words = generate(policy, 100 + i as u64);
		assert_eq!(words.len(), WORDS as usize);

		for (expected, word) in words.iter().enumerate() {
			assert_eq!(word.label() as usize, expected);
			let lines = word.rendered();
			assert!(!lines.is_empty());
			assert!(lines[0].starts_with(&format!("_l{}:", word.label())));

			for (idx, line) in lines.iter().enumerate() {
				assert!(line.len() >= 50, "{:?}: short line {:?}", policy, line);
				if idx > 0 {
					assert!(line.starts_with("        "), "{:?}: bad indent {:?}", policy, line);
				}
				for token in ["xreg", "freg", "symbol"] {
					assert!(
						!line.contains(token),
						"{:?} left {} behind in {:?}",
						policy,
						token,
						line
					);
				}
			}
		}
	}
}

#[test]
fn body_control_flow_terminates() {
	for (i, policy) in Policy::ALL.into_iter().enumerate() {
		for word in generate(policy, 200 + i as u64) {
			if !matches!(
				word.class(),
				InstrClass::Jump | InstrClass::Branch | InstrClass::Return
			) {
				continue;
			}
			for r in word.label_refs() {
				assert!(
					r.label > word.label() && r.label <= WORDS,
					"{:?}: label {} word targets {}",
					policy,
					word.label(),
					r.label
				);
			}
		}
	}
}

#[test]
fn suffix_labels_use_their_own_namespace() {
	let mut gen = Generator::with_seed("RV64G", Policy::RandomInst, 7);
	for _ in 0..50 {
		let mut word = gen.get_word(Part::Suffix);
		gen.populate_word(&mut word, 50, Part::Suffix);
		let lines = word.rendered();
		assert!(lines[0].starts_with("_s"));
		assert!(!lines.iter().any(|line| line.contains("_l")));
	}
}

#[test]
fn relocate_and_remap_keep_a_program_consistent() {
	// drop every other word, compact the labels, and retarget what remains;
	// the shape a mutation engine produces
	let mut words = generate(Policy::RandomInst, 33);
	let survivors: Vec<&mut Word> = words.iter_mut().step_by(2).collect();

	let mut label_map = HashMap::new();
	let mut moved = Vec::new();
	for (new_label, word) in survivors.into_iter().enumerate() {
		if let Some((old, new)) = word.relocate(new_label as u32) {
			label_map.insert(old, new);
		}
		moved.push(word);
	}

	let max_label = moved.len() as u32;
	let mut rng = StdRng::seed_from_u64(99);
	for word in moved {
		word.remap_targets(&label_map, max_label, &mut rng);
		assert!(word.rendered()[0].starts_with(&format!("_l{}:", word.label())));
		for r in word.label_refs() {
			assert!(r.label <= max_label);
			let token = format!("_l{}", r.label);
			assert!(
				word.rendered().iter().any(|line| line.contains(&token)),
				"ref {:?} not reflected in text",
				r
			);
		}
	}
}

#[test]
fn rv32_programs_avoid_wide_opcodes() {
	let mut gen = Generator::with_seed("RV32IMA", Policy::RandomInst, 5);
	for _ in 0..300 {
		let mut word = gen.get_word(Part::Main);
		gen.populate_word(&mut word, 300, Part::Main);
		for line in word.rendered() {
			let inst = line[8..].trim();
			let mnemonic = inst.split_whitespace().next().unwrap_or("");
			assert_ne!(mnemonic, "ld");
			assert_ne!(mnemonic, "sd");
			assert_ne!(mnemonic, "addw");
		}
	}
}
