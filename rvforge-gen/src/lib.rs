//
// Copyright (C) 2025 Ariel Abreu
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! Constrained-random RISC-V test-program synthesis for differential
//! hardware fuzzing.
//!
//! Programs come out as labeled "words": each word is one catalog opcode
//! expanded into a short, self-contained instruction sequence. Control flow
//! inside the fuzzed body only ever moves forward through the labels, so any
//! program that assembles also terminates.

pub mod addr;
pub mod csr;
pub mod generator;
pub mod isa;
pub mod operand;
pub mod policy;
pub mod word;

pub use addr::AddrSynth;
pub use generator::Generator;
pub use operand::Context;
pub use policy::Policy;
pub use word::{InstrClass, LabelRef, Part, SlotSet, Word};
