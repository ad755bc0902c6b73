use super::symbols::SymbolTable;
use crate::definitions::Address;
use crate::simulators::cpu::command::{Instruction, OperandKind};

use std::error;
use std::fmt;

#[derive(Debug, Eq, PartialEq)]
pub enum ErrorKind {
    DuplicateSymbol(String),
    ExpectedInstructionName(String),
    NotEnoughParameters { mnemonic: &'static str, expected: u8 },
    UnexpectedOperand(String),
    InvalidIntegerLiteral(String),
    SymbolNotFound(String),
}

/// A single diagnostic produced during translation.
#[derive(Debug, Eq, PartialEq)]
pub struct AssemblyError {
    pub line: Option<u32>,
    pub kind: ErrorKind,
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(line) = self.line {
            write!(f, "line {}: ", line)?;
        }

        match &self.kind {
            ErrorKind::DuplicateSymbol(name) => write!(f, "duplicate label '{}'", name),
            ErrorKind::ExpectedInstructionName(token) => {
                write!(f, "expected an instruction name, found '{}'", token)
            }
            ErrorKind::NotEnoughParameters { mnemonic, expected } => {
                write!(f, "{} takes {} operand(s)", mnemonic, expected)
            }
            ErrorKind::UnexpectedOperand(token) => write!(f, "unexpected operand '{}'", token),
            ErrorKind::InvalidIntegerLiteral(token) => {
                write!(f, "invalid integer literal '{}'", token)
            }
            ErrorKind::SymbolNotFound(name) => write!(f, "unresolved symbol '{}'", name),
        }
    }
}

impl error::Error for AssemblyError {}

/// All diagnostics of a failed translation, in source order.
#[derive(Debug, Eq, PartialEq)]
pub struct AssemblyErrors(Vec<AssemblyError>);

impl AssemblyErrors {
    pub fn iter(&self) -> impl Iterator<Item = &AssemblyError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AssemblyErrors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl error::Error for AssemblyErrors {}

/// Translate LS-8 assembly source into a program image loadable at
/// address 0. Recoverable errors do not stop the pass, so a failed
/// translation reports every diagnostic at once.
pub fn translate(text: &str) -> Result<Vec<u8>, AssemblyErrors> {
    Assembler::default().translate(text)
}

/// A code byte whose final value is a label address that may not be known
/// yet during the first pass.
struct Fixup {
    symbol: String,
    index: usize,
    line: u32,
}

#[derive(Default)]
struct Assembler {
    code: Vec<u8>,
    symbols: SymbolTable,
    fixups: Vec<Fixup>,
    errors: Vec<AssemblyError>,
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

/// Split the first token off `line`. Whitespace and commas separate tokens;
/// runs of separators collapse. The rest is returned verbatim.
fn split_token(line: &str) -> Option<(&str, &str)> {
    let start = line.find(|c| !is_separator(c))?;
    let line = &line[start..];
    let end = line.find(is_separator).unwrap_or(line.len());
    Some((&line[..end], &line[end..]))
}

fn parse_register(token: &str) -> Option<u8> {
    let bytes = token.as_bytes();
    if bytes.len() == 2 && bytes[0].eq_ignore_ascii_case(&b'r') && bytes[1].is_ascii_digit() {
        let index = bytes[1] - b'0';
        if index < 8 {
            return Some(index);
        }
    }
    None
}

fn parse_int(token: &str) -> Option<u8> {
    if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = token.strip_prefix("0b").or_else(|| token.strip_prefix("0B")) {
        u8::from_str_radix(bin, 2).ok()
    } else {
        token.parse().ok()
    }
}

impl Assembler {
    fn translate(mut self, text: &str) -> Result<Vec<u8>, AssemblyErrors> {
        let text = text.replace("\r\n", "\n");
        for (index, line) in text.split(['\n', '\r']).enumerate() {
            self.line(index as u32 + 1, line);
        }

        self.patch_fixups();

        if self.errors.is_empty() {
            Ok(self.code)
        } else {
            Err(AssemblyErrors(self.errors))
        }
    }

    fn error(&mut self, line: u32, kind: ErrorKind) {
        self.errors.push(AssemblyError {
            line: Some(line),
            kind,
        });
    }

    fn line(&mut self, number: u32, line: &str) {
        // everything from the first ';' or '#' on is a comment
        let line = match line.find([';', '#']) {
            Some(start) => &line[..start],
            None => line,
        };

        let Some((first, rest)) = split_token(line) else {
            return;
        };

        // a label may prefix any statement
        let (statement, rest) = if let Some(label) = first.strip_suffix(':') {
            if !self.symbols.define(label, self.code.len() as Address) {
                self.error(number, ErrorKind::DuplicateSymbol(label.to_owned()));
            }

            match split_token(rest) {
                Some(split) => split,
                None => return,
            }
        } else {
            (first, rest)
        };

        if statement.eq_ignore_ascii_case("db") {
            self.data_byte(number, rest);
        } else if statement.eq_ignore_ascii_case("ds") {
            // the remainder of the line is emitted verbatim
            self.code.extend_from_slice(rest.trim().as_bytes());
        } else {
            self.instruction(number, statement, rest);
        }
    }

    fn data_byte(&mut self, number: u32, rest: &str) {
        match split_token(rest) {
            Some((token, rest)) => {
                match parse_int(token) {
                    Some(value) => self.code.push(value),
                    None => {
                        self.error(number, ErrorKind::InvalidIntegerLiteral(token.to_owned()));
                        self.code.push(0);
                    }
                }
                self.expect_end(number, rest);
            }
            None => self.error(
                number,
                ErrorKind::NotEnoughParameters {
                    mnemonic: "db",
                    expected: 1,
                },
            ),
        }
    }

    fn instruction(&mut self, number: u32, name: &str, mut rest: &str) {
        let Some(instruction) = Instruction::from_mnemonic(name) else {
            self.error(number, ErrorKind::ExpectedInstructionName(name.to_owned()));
            return;
        };

        self.code.push(instruction.opcode());

        let (kind_a, kind_b) = instruction.operands();
        for kind in [kind_a, kind_b] {
            if kind == OperandKind::None {
                break;
            }

            match split_token(rest) {
                Some((token, remainder)) => {
                    self.operand(number, kind, token);
                    rest = remainder;
                }
                None => {
                    self.error(
                        number,
                        ErrorKind::NotEnoughParameters {
                            mnemonic: instruction.mnemonic(),
                            expected: instruction.operand_count(),
                        },
                    );
                    return;
                }
            }
        }

        self.expect_end(number, rest);
    }

    fn operand(&mut self, number: u32, kind: OperandKind, token: &str) {
        match kind {
            OperandKind::Register => match parse_register(token) {
                Some(index) => self.code.push(index),
                None => {
                    self.error(number, ErrorKind::UnexpectedOperand(token.to_owned()));
                    self.code.push(0);
                }
            },
            OperandKind::Immediate => {
                // a token that starts with a digit must be a literal;
                // everything else is a symbol reference resolved later
                if token.starts_with(|c: char| c.is_ascii_digit()) {
                    match parse_int(token) {
                        Some(value) => self.code.push(value),
                        None => {
                            self.error(
                                number,
                                ErrorKind::InvalidIntegerLiteral(token.to_owned()),
                            );
                            self.code.push(0);
                        }
                    }
                } else {
                    self.fixups.push(Fixup {
                        symbol: token.to_owned(),
                        index: self.code.len(),
                        line: number,
                    });
                    self.code.push(0);
                }
            }
            OperandKind::None => {}
        }
    }

    fn expect_end(&mut self, number: u32, rest: &str) {
        if let Some((token, _)) = split_token(rest) {
            self.error(number, ErrorKind::UnexpectedOperand(token.to_owned()));
        }
    }

    fn patch_fixups(&mut self) {
        for fixup in std::mem::take(&mut self.fixups) {
            match self.symbols.lookup(&fixup.symbol) {
                Some(address) => self.code[fixup.index] = address,
                None => self.errors.push(AssemblyError {
                    line: Some(fixup.line),
                    kind: ErrorKind::SymbolNotFound(fixup.symbol),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(errors: AssemblyErrors) -> Vec<ErrorKind> {
        errors.0.into_iter().map(|error| error.kind).collect()
    }

    #[test]
    fn test_translate_print_eight() {
        let program = translate("LDI R0, 8\nPRN R0\nHLT").unwrap();
        assert_eq!(vec![0b1000_0010, 0, 8, 0b0100_0111, 0, 0b0000_0001], program);
    }

    #[test]
    fn test_forward_reference_is_patched() {
        let source = "LDI R0, 1\nLDI R1, END\nJMP R1\nLDI R0, 2\nEND: PRN R0\nHLT";
        let program = translate(source).unwrap();

        // END ends up at byte 11
        assert_eq!(11, program[5]);
        assert_eq!(14, program.len());
    }

    #[test]
    fn test_backward_reference() {
        let program = translate("LOOP: LDI R0, LOOP\nJMP R0").unwrap();
        assert_eq!(vec![0b1000_0010, 0, 0, 0b0101_0100, 0], program);
    }

    #[test]
    fn test_literal_radixes() {
        let program = translate("db 0x2A\ndb 0b1010\ndb 42\ndb 0XFF\ndb 0B11").unwrap();
        assert_eq!(vec![0x2A, 0b1010, 42, 0xFF, 0b11], program);
    }

    #[test]
    fn test_data_string_is_verbatim() {
        let program = translate("MSG: ds Hello, world\n").unwrap();
        assert_eq!(b"Hello, world".to_vec(), program);
    }

    #[test]
    fn test_comments_and_separators() {
        let with_comments = "LDI R0,0x10 ; load the address\n# nothing here\nHLT";
        let plain = "LDI R0 0x10\nHLT";
        assert_eq!(translate(plain).unwrap(), translate(with_comments).unwrap());
    }

    #[test]
    fn test_crlf_and_cr_line_endings() {
        let unix = "LDI R0, 1\nHLT";
        assert_eq!(translate(unix).unwrap(), translate("LDI R0, 1\r\nHLT").unwrap());
        assert_eq!(translate(unix).unwrap(), translate("LDI R0, 1\rHLT").unwrap());
    }

    #[test]
    fn test_label_prefixing_a_statement() {
        let program = translate("START: LDI R0, START\nJMP R0").unwrap();
        assert_eq!(0, program[2]);
    }

    #[test]
    fn test_mnemonics_and_registers_are_case_insensitive() {
        assert_eq!(
            translate("LDI R0, 8\nHLT").unwrap(),
            translate("ldi r0, 8\nhlt").unwrap()
        );
    }

    #[test]
    fn test_duplicate_label_is_rejected() {
        let errors = translate("FOO: NOP\nFOO: NOP\n").unwrap_err();
        assert_eq!(
            vec![ErrorKind::DuplicateSymbol("FOO".to_owned())],
            kinds(errors)
        );
    }

    #[test]
    fn test_unknown_mnemonic() {
        let errors = translate("FROB R0\n").unwrap_err();
        assert_eq!(
            vec![ErrorKind::ExpectedInstructionName("FROB".to_owned())],
            kinds(errors)
        );
    }

    #[test]
    fn test_missing_operand() {
        let errors = translate("LDI R0\n").unwrap_err();
        assert_eq!(
            vec![ErrorKind::NotEnoughParameters {
                mnemonic: "LDI",
                expected: 2,
            }],
            kinds(errors)
        );
    }

    #[test]
    fn test_register_slot_rejects_literals_and_symbols() {
        let errors = translate("LDI 5, 3\nADD R0, FOO\n").unwrap_err();
        assert_eq!(
            vec![
                ErrorKind::UnexpectedOperand("5".to_owned()),
                ErrorKind::UnexpectedOperand("FOO".to_owned()),
            ],
            kinds(errors)
        );
    }

    #[test]
    fn test_trailing_tokens_are_rejected() {
        let errors = translate("HLT R0\n").unwrap_err();
        assert_eq!(
            vec![ErrorKind::UnexpectedOperand("R0".to_owned())],
            kinds(errors)
        );
    }

    #[test]
    fn test_out_of_range_literal() {
        let errors = translate("LDI R0, 256\n").unwrap_err();
        assert_eq!(
            vec![ErrorKind::InvalidIntegerLiteral("256".to_owned())],
            kinds(errors)
        );
    }

    #[test]
    fn test_unresolved_symbol() {
        let errors = translate("LDI R0, NOWHERE\nHLT").unwrap_err();
        assert_eq!(
            vec![ErrorKind::SymbolNotFound("NOWHERE".to_owned())],
            kinds(errors)
        );
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let errors = translate("NOP\nFROB\n\nLDI R0, 300\n").unwrap_err();
        let lines: Vec<_> = errors.iter().map(|error| error.line).collect();
        assert_eq!(vec![Some(2), Some(4)], lines);
    }

    #[test]
    fn test_multiple_errors_in_one_pass() {
        let source = "FOO: NOP\nFOO: NOP\nLDI R9, 1\nJMP MISSING\n";
        let errors = translate(source).unwrap_err();
        assert_eq!(3, errors.len());
    }

    #[test]
    fn test_translation_is_deterministic() {
        let source = "LDI R0, 10\nLDI R1, LOOP\nLOOP: DEC R0\nJMP R1\n";
        assert_eq!(translate(source).unwrap(), translate(source).unwrap());
    }

    #[test]
    fn test_register_like_symbol_in_immediate_slot() {
        // R8 is not a register, so in an immediate slot it is a symbol
        let errors = translate("LDI R0, R8\nHLT").unwrap_err();
        assert_eq!(
            vec![ErrorKind::SymbolNotFound("R8".to_owned())],
            kinds(errors)
        );
    }
}
