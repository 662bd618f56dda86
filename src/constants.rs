/// Total number of addressable words. The program counter is an index into
/// the decoded store, not a byte offset, so this doubles as the instruction
/// space size.
pub const MEM_SIZE: usize = 65_536;

/// All-ones word. As an address it selects the memory-mapped I/O port; as a
/// value it represents -1.
pub const MASK: u16 = 0xFFFF;

/// Reaching or exceeding this program counter value halts the dispatcher.
pub const HALT_PC: u16 = (MEM_SIZE / 2) as u16;

/// Upper bound on the hot-spot list a profiler report will list.
pub const MAX_HOT_SPOTS: usize = 64;
