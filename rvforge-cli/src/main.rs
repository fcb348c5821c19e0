//
// Copyright (C) 2025 Ariel Abreu
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

use std::{fs, path::PathBuf, process::exit};

use clap::{Parser as ClapParser, ValueEnum};

use rvforge_gen::{Generator, InstrClass, Part, Policy};

#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// ISA selection string, e.g. RV64G or RV32IMA
	#[arg(long, default_value = "RV64G")]
	isa: String,

	#[arg(long, value_enum, default_value_t = PolicyArg::RandomInst)]
	policy: PolicyArg,

	/// Words in the CSR-setup region before the fuzzed body
	#[arg(long, default_value_t = 0)]
	prefix: u32,

	/// Words in the fuzzed body
	#[arg(long, default_value_t = 100)]
	words: u32,

	/// Words in the region after the fuzzed body
	#[arg(long, default_value_t = 0)]
	suffix: u32,

	/// RNG seed; omit for a fresh program each run
	#[arg(long)]
	seed: Option<u64>,

	#[arg(short, long)]
	output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
	RandomInst,
	IllLow2high,
	M2sLegalSwitch,
	S2uLegalSwitch,
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

impl From<PolicyArg> for Policy {
	fn from(arg: PolicyArg) -> Self {
		match arg {
			PolicyArg::RandomInst => Policy::RandomInst,
			PolicyArg::IllLow2high => Policy::IllLow2high,
			PolicyArg::M2sLegalSwitch => Policy::M2SLegalSwitch,
			PolicyArg::S2uLegalSwitch => Policy::S2ULegalSwitch,
			PolicyArg::RandSwitch => Policy::RandSwitch,
			PolicyArg::Interrupt => Policy::Interrupt,
			PolicyArg::Exception => Policy::Exception,
			PolicyArg::CounterTimer => Policy::CounterTimer,
			PolicyArg::Hypervisor => Policy::Hypervisor,
			PolicyArg::Bitmap => Policy::Bitmap,
			PolicyArg::Mpt => Policy::Mpt,
			PolicyArg::Cbo => Policy::Cbo,
			PolicyArg::Vector => Policy::Vector,
		}
	}
}

fn region(
	gen: &mut Generator,
	part: Part,
	count: u32,
	class_counts: &mut [u32; 7],
) -> Vec<String> {
	let mut lines = Vec::new();
	for _ in 0..count {
		let mut word = gen.get_word(part);
		class_counts[u8::from(word.class()) as usize] += 1;
		gen.populate_word(&mut word, count, part);
		lines.extend(word.rendered());
	}
	// words may target the label one past the region; define it so the
	// output stands alone
	lines.push(format!("{}{}:", part.label_prefix(), count));
	lines
}

fn main() {
	let args = Args::parse();
	let policy: Policy = args.policy.into();

	let mut gen = match args.seed {
		Some(seed) => Generator::with_seed(&args.isa, policy, seed),
		None => Generator::new(&args.isa, policy),
	};

	let mut class_counts = [0u32; 7];
	let mut lines = Vec::new();

	for (section, part, count) in [
		("fuzz_prefix", Part::Prefix, args.prefix),
		("fuzz_main", Part::Main, args.words),
		("fuzz_suffix", Part::Suffix, args.suffix),
	] {
		if count == 0 {
			continue;
		}
		lines.push(format!("# {} ({} words)", section, count));
		lines.extend(region(&mut gen, part, count, &mut class_counts));
	}

	let text = lines.join("\n") + "\n";
	match &args.output {
		Some(path) => {
			if let Err(err) = fs::write(path, &text) {
				eprintln!("failed to write {}: {}", path.display(), err);
				exit(1);
			}
		}
		None => print!("{}", text),
	}

	let control_flow = [InstrClass::Jump, InstrClass::Branch, InstrClass::Return]
		.iter()
		.map(|class| class_counts[u8::from(*class) as usize])
		.sum::<u32>();
	let memory = class_counts[u8::from(InstrClass::MemRead) as usize]
		+ class_counts[u8::from(InstrClass::MemWrite) as usize];
	eprintln!(
		"{} words: {} control flow, {} memory, {} csr",
		class_counts.iter().sum::<u32>(),
		control_flow,
		memory,
		class_counts[u8::from(InstrClass::Csr) as usize],
	);
}

#[cfg(test)]
mod tests {
	use super::*;

	fn labels_in(lines: &[String]) -> (Vec<String>, Vec<String>) {
		let mut defined = Vec::new();
		let mut referenced = Vec::new();
		for line in lines {
			if let Some(head) = line.split(':').next() {
				if head.starts_with("_l") {
					defined.push(head.to_string());
				}
			}
			for token in line.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_')) {
				if token.starts_with("_l")
					&& token[2..].bytes().all(|b| b.is_ascii_digit())
					&& !token[2..].is_empty()
				{
					referenced.push(token.to_string());
				}
			}
		}
		(defined, referenced)
	}

	#[test]
	fn region_output_defines_every_referenced_label() {
		let mut gen = Generator::with_seed("RV64G", Policy::RandomInst, 21);
		let mut class_counts = [0u32; 7];
		let lines = region(&mut gen, Part::Main, 30, &mut class_counts);

		assert_eq!(lines.last().unwrap(), "_l30:");
		let (defined, referenced) = labels_in(&lines);
		for label in referenced {
			assert!(defined.contains(&label), "{} referenced but never defined", label);
		}
	}
}
