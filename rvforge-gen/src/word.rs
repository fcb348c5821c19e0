//
// Copyright (C) 2025 Ariel Abreu
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! The labeled word: one catalog opcode expanded into a short instruction
//! sequence, carried through the populate/relocate/remap lifecycle.

use std::collections::HashMap;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use rand::Rng;

use crate::isa::OpTemplate;

/// Program region a word belongs to. The prefix runs before the fuzzed body,
/// the suffix after it; each region numbers its labels independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
	Prefix,
	Main,
	Suffix,
}

impl Part {
	pub const fn label_prefix(&self) -> &'static str {
		match self {
			Part::Prefix => "_p",
			Part::Main => "_l",
			Part::Suffix => "_s",
		}
	}
}

/// Behavioral class of a word, driving operand-value strategy downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum InstrClass {
	None = 0,
	Jump = 1,
	Branch = 2,
	Return = 3,
	MemRead = 4,
	MemWrite = 5,
	Csr = 6,
}

/// Operand slots a word still needs values for. Expansion handlers append to
/// these lists as they introduce scratch registers or extra offsets.
#[derive(Debug, Clone, Default)]
pub struct SlotSet {
	pub xregs: Vec<&'static str>,
	pub fregs: Vec<&'static str>,
	pub imms: Vec<(&'static str, u64)>,
	pub symbols: Vec<&'static str>,
}

impl SlotSet {
	pub fn from_template(tpl: &OpTemplate) -> Self {
		SlotSet {
			xregs: tpl.xregs.clone(),
			fregs: tpl.fregs.clone(),
			imms: tpl.imms.clone(),
			symbols: tpl.symbols.clone(),
		}
	}
}

/// A structural record of a code-label reference inside a populated word:
/// which instruction line mentions it and which label number it points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelRef {
	pub line: usize,
	pub label: u32,
}

/// One labeled unit of the synthesized program.
///
/// A word starts as a template expansion with unresolved slot names in its
/// instruction text. `populate` substitutes concrete values exactly once;
/// after that the text is fixed apart from label relocation and target
/// remapping, which operate on the structural `LabelRef` records rather than
/// re-parsing the rendered text.
#[derive(Debug, Clone)]
pub struct Word {
	label: u32,
	class: InstrClass,
	insts: Vec<String>,
	slots: SlotSet,
	populated: bool,
	part: Option<Part>,
	refs: Vec<LabelRef>,
}

const LABEL_COLUMN: usize = 8;
const INST_COLUMN: usize = 42;

/// Parses `_l17`-style text back into a label number for the given part.
fn parse_part_label(text: &str, part: Part) -> Option<u32> {
	let digits = text.strip_prefix(part.label_prefix())?;
	if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	digits.parse().ok()
}

/// Whether `line` mentions `token` as a whole word (not as a prefix of a
/// longer label like `_l7` inside `_l72`).
fn contains_label_token(line: &str, token: &str) -> bool {
	let mut rest = line;
	while let Some(at) = rest.find(token) {
		let after = &rest[at + token.len()..];
		if !after.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
			return true;
		}
		rest = &rest[at + 1..];
	}
	false
}

impl Word {
	pub(crate) fn new(label: u32, class: InstrClass, insts: Vec<String>, slots: SlotSet) -> Self {
		Word {
			label,
			class,
			insts,
			slots,
			populated: false,
			part: None,
			refs: Vec::new(),
		}
	}

	pub fn label(&self) -> u32 {
		self.label
	}

	pub fn class(&self) -> InstrClass {
		self.class
	}

	pub fn is_populated(&self) -> bool {
		self.populated
	}

	pub fn slots(&self) -> &SlotSet {
		&self.slots
	}

	pub fn label_refs(&self) -> &[LabelRef] {
		&self.refs
	}

	/// Substitutes a concrete value for every operand slot and freezes the
	/// word. A second call is a no-op. Panics if a declared slot has no
	/// value in `opvals`.
	pub fn populate(&mut self, opvals: &HashMap<&'static str, String>, part: Part) {
		if self.populated {
			return;
		}

		let mut order: Vec<&'static str> = Vec::new();
		order.extend(&self.slots.xregs);
		order.extend(&self.slots.fregs);
		order.extend(self.slots.imms.iter().map(|(name, _)| name));
		order.extend(&self.slots.symbols);

		for name in &order {
			let value = opvals
				.get(name)
				.unwrap_or_else(|| panic!("no value for operand {} in label {} word", name, self.label));
			for line in &mut self.insts {
				if line.contains(name) {
					*line = line.replace(name, value);
				}
			}
		}

		// record where part-local code labels landed, so retargeting never
		// has to re-scan free text
		for name in &self.slots.symbols {
			let value = &opvals[name];
			if let Some(target) = parse_part_label(value, part) {
				for (idx, line) in self.insts.iter().enumerate() {
					if contains_label_token(line, value) {
						self.refs.push(LabelRef { line: idx, label: target });
					}
				}
			}
		}

		self.part = Some(part);
		self.populated = true;
	}

	/// Moves the word to a new label, returning `(old, new)` when populated.
	pub fn relocate(&mut self, new_label: u32) -> Option<(u32, u32)> {
		let old = self.label;
		self.label = new_label;
		if self.populated {
			Some((old, new_label))
		} else {
			None
		}
	}

	/// Rewrites every recorded label reference through `label_map`. A target
	/// with no mapping is redrawn forward of this word's own label, keeping
	/// control flow pointed downstream.
	pub fn remap_targets<R: Rng>(
		&mut self,
		label_map: &HashMap<u32, u32>,
		max_label: u32,
		rng: &mut R,
	) {
		if !self.populated {
			return;
		}
		let prefix = self.part.expect("populated word has a part").label_prefix();

		for r in &mut self.refs {
			let new = label_map
				.get(&r.label)
				.copied()
				.unwrap_or_else(|| rng.gen_range(self.label + 1..=max_label));
			if new == r.label {
				continue;
			}
			let old_token = format!("{}{}", prefix, r.label);
			let new_token = format!("{}{}", prefix, new);
			self.insts[r.line] = self.insts[r.line].replace(&old_token, &new_token);
			r.label = new;
		}
	}

	/// The fixed-format assembly lines: the first carries the label in an
	/// 8-column field, continuation lines are indented to match, and every
	/// instruction is padded to 42 columns. Panics if the word has not been
	/// populated.
	pub fn rendered(&self) -> Vec<String> {
		assert!(self.populated, "label {} word rendered before populate", self.label);
		let prefix = self.part.expect("populated word has a part").label_prefix();

		self.insts
			.iter()
			.enumerate()
			.map(|(idx, inst)| {
				let head = if idx == 0 {
					format!("{}{}:", prefix, self.label)
				} else {
					String::new()
				};
				format!(
					"{:<w0$}{:<w1$}",
					head,
					inst,
					w0 = LABEL_COLUMN,
					w1 = INST_COLUMN
				)
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::rngs::StdRng;
	use rand::SeedableRng;

	fn opvals(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
		pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
	}

	fn branch_word(label: u32) -> Word {
		let slots = SlotSet {
			xregs: vec!["xreg0", "xreg1"],
			fregs: vec![],
			imms: vec![],
			symbols: vec!["symbol"],
		};
		Word::new(
			label,
			InstrClass::Branch,
			vec!["beq xreg0, xreg1, symbol".to_string()],
			slots,
		)
	}

	#[test]
	fn populate_substitutes_and_renders() {
		let mut word = branch_word(3);
		word.populate(
			&opvals(&[("xreg0", "x5"), ("xreg1", "x11"), ("symbol", "_l7")]),
			Part::Main,
		);

		let lines = word.rendered();
		assert_eq!(lines.len(), 1);
		assert!(lines[0].starts_with("_l3:    beq x5, x11, _l7"));
		assert_eq!(lines[0].len(), 50);
		assert_eq!(word.label_refs(), &[LabelRef { line: 0, label: 7 }]);
	}

	#[test]
	fn populate_is_idempotent() {
		let mut word = branch_word(0);
		word.populate(
			&opvals(&[("xreg0", "x1"), ("xreg1", "x2"), ("symbol", "_l4")]),
			Part::Main,
		);
		let first = word.rendered();

		word.populate(
			&opvals(&[("xreg0", "x30"), ("xreg1", "x31"), ("symbol", "_l9")]),
			Part::Main,
		);
		assert_eq!(word.rendered(), first);
	}

	#[test]
	#[should_panic(expected = "no value for operand")]
	fn populate_missing_operand_panics() {
		let mut word = branch_word(0);
		word.populate(&opvals(&[("xreg0", "x1"), ("xreg1", "x2")]), Part::Main);
	}

	#[test]
	fn continuation_lines_indent_without_label() {
		let slots = SlotSet {
			xregs: vec!["xreg0", "xreg1"],
			fregs: vec![],
			imms: vec![],
			symbols: vec!["symbol"],
		};
		let mut word = Word::new(
			2,
			InstrClass::Jump,
			vec![
				"la xreg1, symbol".to_string(),
				"jalr xreg0, 0(xreg1)".to_string(),
			],
			slots,
		);
		word.populate(
			&opvals(&[("xreg0", "x3"), ("xreg1", "x9"), ("symbol", "_l5")]),
			Part::Main,
		);

		let lines = word.rendered();
		assert_eq!(lines.len(), 2);
		assert!(lines[1].starts_with("        jalr x3, 0(x9)"));
		assert_eq!(word.label_refs(), &[LabelRef { line: 0, label: 5 }]);
	}

	#[test]
	fn relocate_reports_move_only_when_populated() {
		let mut word = branch_word(4);
		assert_eq!(word.relocate(6), None);
		word.populate(
			&opvals(&[("xreg0", "x1"), ("xreg1", "x2"), ("symbol", "_l8")]),
			Part::Main,
		);
		assert_eq!(word.relocate(9), Some((6, 9)));
		assert!(word.rendered()[0].starts_with("_l9:"));
	}

	#[test]
	fn remap_rewrites_mapped_targets() {
		let mut word = branch_word(1);
		word.populate(
			&opvals(&[("xreg0", "x1"), ("xreg1", "x2"), ("symbol", "_l5")]),
			Part::Main,
		);

		let mut rng = StdRng::seed_from_u64(7);
		let map = HashMap::from([(5, 12)]);
		word.remap_targets(&map, 20, &mut rng);

		assert!(word.rendered()[0].contains("_l12"));
		assert_eq!(word.label_refs(), &[LabelRef { line: 0, label: 12 }]);
	}

	#[test]
	fn remap_redraws_unmapped_targets_forward() {
		let mut word = branch_word(3);
		word.populate(
			&opvals(&[("xreg0", "x1"), ("xreg1", "x2"), ("symbol", "_l5")]),
			Part::Main,
		);

		let mut rng = StdRng::seed_from_u64(11);
		word.remap_targets(&HashMap::new(), 10, &mut rng);

		let target = word.label_refs()[0].label;
		assert!(target > 3 && target <= 10);
		assert!(word.rendered()[0].contains(&format!("_l{}", target)));
	}

	#[test]
	fn data_symbols_produce_no_refs() {
		let slots = SlotSet {
			xregs: vec!["xreg0", "xreg1"],
			fregs: vec![],
			imms: vec![("imm6", 4)],
			symbols: vec!["symbol"],
		};
		let mut word = Word::new(
			0,
			InstrClass::MemRead,
			vec![
				"la xreg1, symbol".to_string(),
				"lw xreg0, imm6(xreg1)".to_string(),
			],
			slots,
		);
		word.populate(
			&opvals(&[
				("xreg0", "x4"),
				("xreg1", "x5"),
				("imm6", "12"),
				("symbol", "d_2_13"),
			]),
			Part::Main,
		);
		assert!(word.label_refs().is_empty());
	}

	#[test]
	fn label_token_matching_respects_boundaries() {
		assert!(contains_label_token("jal x0, _l7", "_l7"));
		assert!(!contains_label_token("jal x0, _l72", "_l7"));
		assert!(contains_label_token("beq x1, x2, _l7 ", "_l7"));
	}
}
