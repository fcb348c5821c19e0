//
// Copyright (C) 2025 Ariel Abreu
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

//! Weighted-heuristic synthesis of "interesting" memory and jump addresses:
//! page straddles, address-space extremes, misaligned pointers, clustered hot
//! pages, and cache-line boundaries.

use lazy_static::lazy_static;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;

pub const PAGE_SIZE: u64 = 4096;
const MAX_USER_ADDR: u64 = (1 << 48) - 1;
const CACHE_LINE: u64 = 64;

const MEM_WEIGHTS: [u32; 7] = [36, 54, 27, 45, 18, 20, 20];
const JUMP_WEIGHTS: [u32; 4] = [35, 5, 15, 15];

const CODE_BASE: u64 = 0x8000_0000;

lazy_static! {
	static ref MEM_DIST: WeightedIndex<u32> = WeightedIndex::new(MEM_WEIGHTS).unwrap();
	static ref JUMP_DIST: WeightedIndex<u32> = WeightedIndex::new(JUMP_WEIGHTS).unwrap();
}

/// Address synthesizer with sticky hot-page and cache-line bases, so repeated
/// draws cluster around the same pages until the bases are re-rolled.
#[derive(Debug)]
pub struct AddrSynth {
	hot_page: u64,
	cross_line: u64,
}

fn random_page<R: Rng>(rng: &mut R) -> u64 {
	rng.gen_range(0..u64::MAX / PAGE_SIZE) * PAGE_SIZE
}

// cross-line bases stay below the canonical user-space limit
fn user_page<R: Rng>(rng: &mut R) -> u64 {
	rng.gen_range(0..MAX_USER_ADDR / PAGE_SIZE) * PAGE_SIZE
}

impl AddrSynth {
	pub fn new<R: Rng>(rng: &mut R) -> Self {
		AddrSynth {
			hot_page: random_page(rng),
			cross_line: user_page(rng),
		}
	}

	pub fn reseed<R: Rng>(&mut self, rng: &mut R) {
		self.hot_page = random_page(rng);
		self.cross_line = user_page(rng);
	}

	pub fn mem_addr<R: Rng>(&mut self, rng: &mut R) -> u64 {
		let category = MEM_DIST.sample(rng);
		self.mem_addr_in(category, rng)
	}

	pub(crate) fn mem_addr_in<R: Rng>(&mut self, category: usize, rng: &mut R) -> u64 {
		match category {
			// near-null
			0 => rng.gen_range(0..=PAGE_SIZE / 2),
			// page-boundary straddle
			1 => {
				let base = random_page(rng);
				let off = *[0, PAGE_SIZE - 1, PAGE_SIZE, PAGE_SIZE + 1]
					.choose(rng)
					.unwrap();
				base.wrapping_add(off)
			}
			// top of the whole address space, past the user-space limit
			2 => u64::MAX - rng.gen_range(0..=10 * PAGE_SIZE),
			// misaligned anywhere
			3 => {
				let mut addr = rng.gen_range(0..u64::MAX) | rng.gen_range(1..=7);
				if rng.gen::<f64>() < 0.7 {
					addr |= 0xFFF;
				}
				addr
			}
			// near a live allocation of this process
			4 => {
				let anchor = vec![0u64; 4];
				let delta = rng.gen_range(-(2i64 << 20)..=2 << 20);
				(anchor.as_ptr() as u64).wrapping_add(delta as u64)
			}
			// hot page: cluster draws on one sticky page
			5 => {
				if rng.gen::<f64>() < 0.1 {
					self.hot_page = random_page(rng);
				}
				let off = if rng.gen::<f64>() < 0.5 {
					rng.gen_range(0..PAGE_SIZE)
				} else {
					60 + CACHE_LINE * rng.gen_range(0..=62)
				};
				self.hot_page.wrapping_add(off)
			}
			// cache-line straddle on a sticky base
			6 => {
				let off = *[0x3C, 0x7C, 0xBC].choose(rng).unwrap();
				self.cross_line.wrapping_add(off)
			}
			_ => unreachable!("mem address category {}", category),
		}
	}

	pub fn jump_addr<R: Rng>(&mut self, rng: &mut R) -> u64 {
		let category = JUMP_DIST.sample(rng);
		self.jump_addr_in(category, rng)
	}

	pub(crate) fn jump_addr_in<R: Rng>(&mut self, category: usize, rng: &mut R) -> u64 {
		match category {
			// around the code base
			0 => {
				let delta = rng.gen_range(-65536i64..=65536);
				CODE_BASE.wrapping_add(delta as u64)
			}
			// near static data of this process
			1 => {
				static DATA_ANCHOR: [u64; 16] = [0; 16];
				let delta = rng.gen_range(-(PAGE_SIZE as i64)..=PAGE_SIZE as i64);
				(DATA_ANCHOR.as_ptr() as u64).wrapping_add(delta as u64)
			}
			// page-aligned code page plus a boundary offset
			2 => {
				let base = CODE_BASE + PAGE_SIZE * rng.gen_range(0..16);
				base + *[0, PAGE_SIZE - 4, PAGE_SIZE].choose(rng).unwrap()
			}
			// misaligned code pointer
			3 => {
				let mut addr = rng.gen_range(CODE_BASE..0x9000_0000u64) | rng.gen_range(1..=3);
				if rng.gen::<f64>() < 0.7 {
					addr |= 0xFFF;
				}
				addr
			}
			_ => unreachable!("jump address category {}", category),
		}
	}

	pub(crate) fn pick_mem_category<R: Rng>(rng: &mut R) -> usize {
		MEM_DIST.sample(rng)
	}
}
