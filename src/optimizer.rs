//! The peephole optimizer: one forward pass over the loaded image that
//! recognizes canonical SUBLEQ idioms and rewrites each into a single
//! decoded instruction.

use crate::constants::{MASK, MEM_SIZE};
use crate::instruction::{Instruction, Opcode};
use crate::memory::Memory;
use crate::pattern::match_pattern;
use crate::Word;

fn decode_subleq_at(memory: &Memory, i: Word) -> Instruction {
    Instruction::subleq(
        memory.read(i),
        memory.read(i.wrapping_add(1)),
        memory.read(i.wrapping_add(2)),
    )
}

/// Precomputed per-cell predicates consulted by the recognizers whose
/// correctness depends on a constant value at load time (ILOAD/LDINC's
/// sentinel fusion, INV's `mem[t] == 1` check, and the INC/DEC/SUB
/// disambiguation).
struct Predicates {
    is_one: Vec<bool>,
    is_neg_one: Vec<bool>,
}

impl Predicates {
    fn build(memory: &Memory) -> Predicates {
        let cells = memory.as_slice();
        Predicates {
            is_one: cells.iter().map(|&w| w == 1).collect(),
            is_neg_one: cells.iter().map(|&w| w == MASK).collect(),
        }
    }

    fn is_one(&self, addr: Word) -> bool {
        self.is_one[addr as usize]
    }

    fn is_neg_one(&self, addr: Word) -> bool {
        self.is_neg_one[addr as usize]
    }
}

fn recognize_istore(memory: &Memory, i: Word, window: usize) -> Option<Instruction> {
    let pat = "0Z> 11> 22> Z3> Z4> ZZ> 56> 77> Z7> 6Z> ZZ> 66>";
    let caps = match_pattern(memory, i, window, pat, &[])?;
    Some(Instruction {
        opcode: Opcode::Istore,
        src: caps.var(5),
        dst: caps.var(0),
        aux: 0,
    })
}

fn recognize_iload_or_ldinc(memory: &Memory, i: Word, window: usize) -> Option<Instruction> {
    let head_pat = "00> !Z> Z0> ZZ> 11> ?Z> Z1> ZZ>";
    let caps = match_pattern(memory, i, window, head_pat, &[])?;
    if caps.var(0) != i.wrapping_add(15) {
        return None;
    }

    let p = caps.bang(0);
    let dst = caps.var(1);

    if window >= 27 {
        let fuse_base = i.wrapping_add(24);
        if let Some(fcaps) = match_pattern(memory, fuse_base, window - 24, "!!>", &[]) {
            let a = fcaps.bang(0);
            let b = fcaps.bang(1);
            if a != b && memory.read(a) == MASK && b == p {
                return Some(Instruction {
                    opcode: Opcode::Ldinc,
                    src: p,
                    dst,
                    aux: 0,
                });
            }
        }
    }

    Some(Instruction {
        opcode: Opcode::Iload,
        src: p,
        dst,
        aux: 0,
    })
}

fn recognize_lshift(memory: &Memory, i: Word, window: usize) -> Option<Instruction> {
    const BLOCK: &str = "!Z> Z!> ZZ>";

    let mut k: usize = 0;
    let mut common: Option<(Word, Word)> = None;
    let mut offset: usize = 0;

    while window >= offset + 9 {
        let base = i.wrapping_add(offset as Word);
        let caps = match match_pattern(memory, base, window - offset, BLOCK, &[]) {
            Some(c) => c,
            None => break,
        };
        let (s, d) = (caps.bang(0), caps.bang(1));
        if s != d {
            break;
        }
        match common {
            None => common = Some((s, d)),
            Some((cs, cd)) if cs == s && cd == d => {}
            Some(_) => break,
        }
        k += 1;
        offset += 9;
    }

    if k >= 2 {
        let (_, d) = common.unwrap();
        Some(Instruction {
            opcode: Opcode::Lshift,
            src: k as Word,
            dst: d,
            aux: 0,
        })
    } else {
        None
    }
}

fn recognize_iadd(memory: &Memory, i: Word, window: usize) -> Option<Instruction> {
    let caps = match_pattern(memory, i, window, "01> 23> 44> 14> 3Z> 11> 33>", &[])?;
    Some(Instruction {
        opcode: Opcode::Iadd,
        src: caps.var(2),
        dst: caps.var(0),
        aux: 0,
    })
}

fn recognize_inv(memory: &Memory, i: Word, window: usize, preds: &Predicates) -> Option<Instruction> {
    let caps = match_pattern(memory, i, window, "00> 10> 11> 2Z> Z1> ZZ> !1>", &[])?;
    let t = caps.bang(0);
    if !preds.is_one(t) {
        return None;
    }
    Some(Instruction {
        opcode: Opcode::Inv,
        src: 0,
        dst: caps.var(1),
        aux: 0,
    })
}

fn recognize_isub(memory: &Memory, i: Word, window: usize) -> Option<Instruction> {
    let caps = match_pattern(memory, i, window, "01> 33> 14> 5Z> 11>", &[])?;
    Some(Instruction {
        opcode: Opcode::Isub,
        src: caps.var(5),
        dst: caps.var(0),
        aux: 0,
    })
}

fn recognize_ijmp(memory: &Memory, i: Word, window: usize) -> Option<Instruction> {
    let caps = match_pattern(memory, i, window, "00> !Z> Z0> ZZ> ZZ>", &[])?;
    if caps.var(0) != i.wrapping_add(14) {
        return None;
    }
    Some(Instruction {
        opcode: Opcode::Ijmp,
        src: 0,
        dst: caps.bang(0),
        aux: 0,
    })
}

fn recognize_mov(memory: &Memory, i: Word, window: usize) -> Option<Instruction> {
    let caps = match_pattern(memory, i, window, "00> !Z> Z0> ZZ>", &[])?;
    let dst = caps.var(0);
    let src = caps.bang(0);
    if src == dst {
        return None;
    }
    Some(Instruction {
        opcode: Opcode::Mov,
        src,
        dst,
        aux: 0,
    })
}

fn recognize_double_or_add(memory: &Memory, i: Word, window: usize) -> Option<Instruction> {
    let caps = match_pattern(memory, i, window, "!Z> Z!> ZZ>", &[])?;
    let (s, d) = (caps.bang(0), caps.bang(1));
    let opcode = if s == d { Opcode::Double } else { Opcode::Add };
    Some(Instruction {
        opcode,
        src: s,
        dst: d,
        aux: 0,
    })
}

fn recognize_neg(memory: &Memory, i: Word, window: usize) -> Option<Instruction> {
    let caps = match_pattern(memory, i, window, "00> 10>", &[])?;
    Some(Instruction {
        opcode: Opcode::Neg,
        src: caps.var(1),
        dst: caps.var(0),
        aux: 0,
    })
}

fn recognize_zero(memory: &Memory, i: Word, window: usize) -> Option<Instruction> {
    let caps = match_pattern(memory, i, window, "00>", &[])?;
    Some(Instruction {
        opcode: Opcode::Zero,
        src: 0,
        dst: caps.var(0),
        aux: 0,
    })
}

fn recognize_halt(memory: &Memory, i: Word, window: usize) -> Option<Instruction> {
    let caps = match_pattern(memory, i, window, "ZZ!", &[])?;
    if caps.bang(0) != MASK {
        return None;
    }
    Some(Instruction {
        opcode: Opcode::Halt,
        src: 0,
        dst: 0,
        aux: 0,
    })
}

fn recognize_jmp(memory: &Memory, i: Word, window: usize) -> Option<Instruction> {
    let caps = match_pattern(memory, i, window, "00!", &[])?;
    let target = caps.bang(0);
    if target == i {
        return Some(Instruction {
            opcode: Opcode::Halt,
            src: 0,
            dst: 0,
            aux: 0,
        });
    }
    Some(Instruction {
        opcode: Opcode::Jmp,
        src: caps.var(0),
        dst: target,
        aux: 0,
    })
}

fn recognize_get(memory: &Memory, i: Word, window: usize) -> Option<Instruction> {
    let caps = match_pattern(memory, i, window, "N!>", &[])?;
    Some(Instruction {
        opcode: Opcode::Get,
        src: 0,
        dst: caps.bang(0),
        aux: 0,
    })
}

fn recognize_put(memory: &Memory, i: Word, window: usize) -> Option<Instruction> {
    let caps = match_pattern(memory, i, window, "!N>", &[])?;
    Some(Instruction {
        opcode: Opcode::Put,
        src: caps.bang(0),
        dst: 0,
        aux: 0,
    })
}

fn recognize_inc_dec_sub(
    memory: &Memory,
    i: Word,
    window: usize,
    preds: &Predicates,
) -> Option<Instruction> {
    let caps = match_pattern(memory, i, window, "!!>", &[])?;
    let (s, d) = (caps.bang(0), caps.bang(1));
    if s == d {
        return None;
    }
    if preds.is_neg_one(s) {
        Some(Instruction {
            opcode: Opcode::Inc,
            src: 0,
            dst: d,
            aux: 0,
        })
    } else if preds.is_one(s) {
        Some(Instruction {
            opcode: Opcode::Dec,
            src: 0,
            dst: d,
            aux: 0,
        })
    } else {
        Some(Instruction {
            opcode: Opcode::Sub,
            src: s,
            dst: d,
            aux: 0,
        })
    }
}

fn recognize(memory: &Memory, i: Word, window: usize, preds: &Predicates) -> Option<Instruction> {
    recognize_istore(memory, i, window)
        .or_else(|| recognize_iload_or_ldinc(memory, i, window))
        .or_else(|| recognize_lshift(memory, i, window))
        .or_else(|| recognize_iadd(memory, i, window))
        .or_else(|| recognize_inv(memory, i, window, preds))
        .or_else(|| recognize_isub(memory, i, window))
        .or_else(|| recognize_ijmp(memory, i, window))
        .or_else(|| recognize_mov(memory, i, window))
        .or_else(|| recognize_double_or_add(memory, i, window))
        .or_else(|| recognize_neg(memory, i, window))
        .or_else(|| recognize_zero(memory, i, window))
        .or_else(|| recognize_halt(memory, i, window))
        .or_else(|| recognize_jmp(memory, i, window))
        .or_else(|| recognize_get(memory, i, window))
        .or_else(|| recognize_put(memory, i, window))
        .or_else(|| recognize_inc_dec_sub(memory, i, window, preds))
}

/// Runs the optimizer over `[0, load_size)` and returns a decoded store the
/// same length as memory, plus the per-opcode substitution counts (how many
/// cells in `[0, load_size)` decoded to each opcode, fallback SUBLEQ
/// included) for the `-s` statistics table.
pub fn optimize_counted(memory: &Memory, load_size: usize) -> (Vec<Instruction>, [u64; 21]) {
    let preds = Predicates::build(memory);
    let mut decoded = vec![Instruction::subleq(0, 0, 0); MEM_SIZE];
    let mut substitutions = [0u64; 21];

    let mut i: usize = 0;
    while i < load_size {
        let window = load_size - i;
        let instr = recognize(memory, i as Word, window, &preds)
            .unwrap_or_else(|| decode_subleq_at(memory, i as Word));
        substitutions[instr.opcode as usize] += 1;
        decoded[i] = instr;
        i += 1;
    }

    for i in load_size..MEM_SIZE {
        decoded[i] = decode_subleq_at(memory, i as Word);
    }

    (decoded, substitutions)
}

/// Runs the optimizer over `[0, load_size)` and returns a decoded store the
/// same length as memory. Cells outside `load_size` (and any cell inside it
/// that no recognizer claims) fall back to raw SUBLEQ decoding.
pub fn optimize(memory: &Memory, load_size: usize) -> Vec<Instruction> {
    optimize_counted(memory, load_size).0
}

/// Decodes every cell as raw SUBLEQ, bypassing the optimizer entirely (the
/// `-O` CLI flag).
pub fn decode_raw(memory: &Memory) -> Vec<Instruction> {
    (0..MEM_SIZE)
        .map(|i| decode_subleq_at(memory, i as Word))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn image(words: &[Word]) -> Memory {
        let mut m = Memory::new();
        m.load(words);
        m
    }

    #[test]
    fn zero_idiom() {
        let m = image(&[5, 5, 3]);
        let decoded = optimize(&m, 3);
        assert_eq!(decoded[0].opcode, Opcode::Zero);
        assert_eq!(decoded[0].dst, 5);
    }

    #[test]
    fn unconditional_jump_idiom() {
        let m = image(&[0, 0, 10]);
        let decoded = optimize(&m, 3);
        assert_eq!(decoded[0].opcode, Opcode::Jmp);
        assert_eq!(decoded[0].dst, 10);
        assert_eq!(decoded[0].src, 0);
    }

    #[test]
    fn self_jump_collapses_to_halt() {
        let m = image(&[0, 0, 0]);
        let decoded = optimize(&m, 3);
        assert_eq!(decoded[0].opcode, Opcode::Halt);
    }

    #[test]
    fn get_idiom() {
        let m = image(&[MASK, 100, 3]);
        let decoded = optimize(&m, 3);
        assert_eq!(decoded[0].opcode, Opcode::Get);
        assert_eq!(decoded[0].dst, 100);
    }

    #[test]
    fn put_idiom() {
        let m = image(&[7, MASK, 3]);
        let decoded = optimize(&m, 3);
        assert_eq!(decoded[0].opcode, Opcode::Put);
        assert_eq!(decoded[0].src, 7);
    }

    #[test]
    fn lshift_fusion_of_four_blocks() {
        // four back-to-back doubling blocks "!Z> Z!> ZZ>" on cell 100
        let mut words = Vec::new();
        for _ in 0..4 {
            let base = words.len() as Word;
            words.push(100); // ! capture s = 100
            words.push(0); // Z
            words.push(base + 1); // >
            words.push(0); // Z
            words.push(100); // ! capture d = 100
            words.push(base + 4); // >
            words.push(0); // Z
            words.push(0); // Z
            words.push(base + 8); // >
        }
        let m = image(&words);
        let decoded = optimize(&m, words.len());
        assert_eq!(decoded[0].opcode, Opcode::Lshift);
        assert_eq!(decoded[0].dst, 100);
        assert_eq!(decoded[0].src, 4);
    }

    #[test]
    fn single_block_is_double_not_lshift() {
        let mut words = Vec::new();
        for _ in 0..1 {
            let base = words.len() as Word;
            words.push(100);
            words.push(0);
            words.push(base + 1);
            words.push(0);
            words.push(100);
            words.push(base + 4);
            words.push(0);
            words.push(0);
            words.push(base + 8);
        }
        let m = image(&words);
        let decoded = optimize(&m, words.len());
        // single block: recognizer 9 claims it as DOUBLE, not LSHIFT
        assert_eq!(decoded[0].opcode, Opcode::Double);
    }

    #[test]
    fn fallback_decodes_as_subleq() {
        let m = image(&[1, 2, 3]);
        let decoded = decode_raw(&m);
        assert_eq!(decoded[0].opcode, Opcode::Subleq);
        assert_eq!(decoded[0].src, 1);
        assert_eq!(decoded[0].dst, 2);
        assert_eq!(decoded[0].aux, 3);
    }

    #[test]
    fn neg_idiom_recognized_ahead_of_zero_sub() {
        // dst=20, src=21, at address 0: "00> 10>" = [20, 20, 3, 21, 20, 6]
        let m = image(&[20, 20, 3, 21, 20, 6]);
        let decoded = optimize(&m, 6);
        assert_eq!(decoded[0].opcode, Opcode::Neg);
        assert_eq!(decoded[0].dst, 20);
        assert_eq!(decoded[0].src, 21);
    }

    #[test]
    fn minus_o_and_optimized_agree_on_zero_idiom() {
        let m = image(&[5, 5, 3]);
        let optimized = optimize(&m, 3);
        let raw = decode_raw(&m);
        assert_eq!(optimized[0].opcode, Opcode::Zero);
        assert_eq!(raw[0].opcode, Opcode::Subleq);
        assert_eq!(raw[0].src, 5);
        assert_eq!(raw[0].dst, 5);
        assert_eq!(raw[0].aux, 3);
    }
}
