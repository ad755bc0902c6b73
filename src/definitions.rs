// Memory map and register conventions of the LS-8.

// a register or memory cell value
pub type Word = u8;
// an address in the 256-byte address space
pub type Address = u8;

pub const MEM_SIZE: usize = 256;
pub const NUM_REGISTERS: usize = 8;

// registers reserved by convention
pub const IM: usize = 5;
pub const IS: usize = 6;
pub const SP: usize = 7;

pub const INIT_SP: Word = 0xF3;
// a keyboard byte is deposited here before interrupt 1 fires
pub const KEY_BUFFER: Address = 0xF4;
// the handler address for interrupt n lives at VECTOR_BASE + n
pub const VECTOR_BASE: Address = 0xF8;

pub const TIMER_INTERRUPT: u8 = 0;
pub const KEYBOARD_INTERRUPT: u8 = 1;

// cycles between timer interrupts unless the host configures a rate;
// stepping at this many instructions per second gives a 1 Hz timer
pub const DEFAULT_CLOCK_HZ: u64 = 10_000;
