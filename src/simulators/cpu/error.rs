use crate::definitions::Address;
use std::{error, fmt, io};

#[derive(Debug)]
pub enum RuntimeError {
    InvalidInstruction { opcode: u8, address: Address },
    InterruptReturnOutsideInterrupt,
    InterruptReturnInvalidFlagsValue(u8),
    DivisionByZero { address: Address },
    ProgramTooLarge(usize),
    Io(io::Error),
}

impl From<io::Error> for RuntimeError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidInstruction { opcode, address } => {
                write!(f, "Invalid opcode at {:02X}: {:08b}", address, opcode)
            }
            Self::InterruptReturnOutsideInterrupt => {
                write!(f, "IRET while no interrupt is being handled")
            }
            Self::InterruptReturnInvalidFlagsValue(byte) => {
                write!(f, "Invalid flags byte on interrupt return: {:08b}", byte)
            }
            Self::DivisionByZero { address } => {
                write!(f, "Division by zero at {:02X}", address)
            }
            Self::ProgramTooLarge(len) => {
                write!(f, "Program is {} bytes, but memory holds 256", len)
            }
            Self::Io(error) => write!(f, "{}", error),
        }
    }
}

impl error::Error for RuntimeError {}
