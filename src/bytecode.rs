//! The bytecode format: opcode layout, instruction decoding, and the encoding
//! helpers a compiler (or test fixture) uses to build an image byte-for-byte.
use crate::error::BytecodeError;

/// A program-counter offset into a bytecode image.
pub type Pc = u32;

/// The opcode tag occupying the low 4 bits of an instruction's head byte.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OpTag {
    Step,
    Left,
    PickUp,
    Place,
    Retn,
    Stop,
    Branch,
    BranchLinked,
    Repeat,
}

impl OpTag {
    fn from_bits(bits: u8) -> Result<Self, u8> {
        match bits {
            0 => Ok(OpTag::Step),
            1 => Ok(OpTag::Left),
            2 => Ok(OpTag::PickUp),
            3 => Ok(OpTag::Place),
            4 => Ok(OpTag::Retn),
            5 => Ok(OpTag::Stop),
            6 => Ok(OpTag::Branch),
            7 => Ok(OpTag::BranchLinked),
            8 => Ok(OpTag::Repeat),
            other => Err(other),
        }
    }

    fn to_bits(self) -> u8 {
        match self {
            OpTag::Step => 0,
            OpTag::Left => 1,
            OpTag::PickUp => 2,
            OpTag::Place => 3,
            OpTag::Retn => 4,
            OpTag::Stop => 5,
            OpTag::Branch => 6,
            OpTag::BranchLinked => 7,
            OpTag::Repeat => 8,
        }
    }

    /// Will return the fixed instruction length, in bytes, for this tag.
    pub fn len(self) -> usize {
        use crate::definitions::bytecode::{LEN_BRANCH, LEN_REPEAT, LEN_SIMPLE};
        match self {
            OpTag::Step
            | OpTag::Left
            | OpTag::PickUp
            | OpTag::Place
            | OpTag::Retn
            | OpTag::Stop => LEN_SIMPLE,
            OpTag::Branch | OpTag::BranchLinked => LEN_BRANCH,
            OpTag::Repeat => LEN_REPEAT,
        }
    }
}

/// The condition code occupying bits 4..7 of a `BRANCH`/`BRANCH_LINKED` head
/// byte. Meaningless (and always zero) for every other opcode.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ConditionCode {
    IsWall,
    IsFlag,
    IsHome,
    IsNorth,
    IsWest,
    IsSouth,
    IsEast,
    None,
}

impl ConditionCode {
    fn from_bits(bits: u8) -> Result<Self, u8> {
        match bits {
            0 => Ok(ConditionCode::IsWall),
            1 => Ok(ConditionCode::IsFlag),
            2 => Ok(ConditionCode::IsHome),
            3 => Ok(ConditionCode::IsNorth),
            4 => Ok(ConditionCode::IsWest),
            5 => Ok(ConditionCode::IsSouth),
            6 => Ok(ConditionCode::IsEast),
            7 => Ok(ConditionCode::None),
            other => Err(other),
        }
    }

    fn to_bits(self) -> u8 {
        match self {
            ConditionCode::IsWall => 0,
            ConditionCode::IsFlag => 1,
            ConditionCode::IsHome => 2,
            ConditionCode::IsNorth => 3,
            ConditionCode::IsWest => 4,
            ConditionCode::IsSouth => 5,
            ConditionCode::IsEast => 6,
            ConditionCode::None => 7,
        }
    }
}

const TAG_MASK: u8 = 0x0F;
const COND_SHIFT: u8 = 4;
const COND_MASK: u8 = 0x07;
const INVERT_BIT: u8 = 0x80;

/// The decoded head byte of an instruction.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Head {
    pub tag: OpTag,
    pub condcode: ConditionCode,
    pub invert: bool,
}

/// Will decode the bit-packed head byte of an instruction into its tag,
/// condition code, and invert flag.
pub fn decode_head(byte: u8, pc: Pc) -> Result<Head, BytecodeError> {
    let tag =
        OpTag::from_bits(byte & TAG_MASK).map_err(|bits| BytecodeError::InvalidOpcode(bits, pc))?;
    let condcode = ConditionCode::from_bits((byte >> COND_SHIFT) & COND_MASK)
        .map_err(|bits| BytecodeError::InvalidOpcode(bits, pc))?;
    let invert = byte & INVERT_BIT != 0;
    Ok(Head {
        tag,
        condcode,
        invert,
    })
}

/// Will encode a head byte for a non-branch opcode (condition fields zeroed).
pub fn encode_simple(tag: OpTag) -> u8 {
    tag.to_bits()
}

/// Will encode a head byte for `BRANCH`/`BRANCH_LINKED`.
pub fn encode_branch_head(tag: OpTag, condcode: ConditionCode, invert: bool) -> u8 {
    let mut byte = tag.to_bits() | (condcode.to_bits() << COND_SHIFT);
    if invert {
        byte |= INVERT_BIT;
    }
    byte
}

fn read_u32_le(image: &[u8], at: usize, pc: Pc) -> Result<u32, BytecodeError> {
    let bytes: [u8; 4] = image
        .get(at..at + 4)
        .ok_or(BytecodeError::PcOutOfRange {
            pc,
            len: image.len(),
        })?
        .try_into()
        .expect("slice of len 4 converts infallibly");
    Ok(u32::from_le_bytes(bytes))
}

fn read_u16_le(image: &[u8], at: usize, pc: Pc) -> Result<u16, BytecodeError> {
    let bytes: [u8; 2] = image
        .get(at..at + 2)
        .ok_or(BytecodeError::PcOutOfRange {
            pc,
            len: image.len(),
        })?
        .try_into()
        .expect("slice of len 2 converts infallibly");
    Ok(u16::from_le_bytes(bytes))
}

/// Will read the 4-byte target PC following a `BRANCH`/`BRANCH_LINKED` head byte
/// at `pc`.
pub fn read_branch_target(image: &[u8], pc: Pc) -> Result<Pc, BytecodeError> {
    read_u32_le(image, pc as usize + 1, pc)
}

/// Will read the 4-byte loop-top PC and 2-byte iteration count following a
/// `REPEAT` head byte at `pc`.
pub fn read_repeat(image: &[u8], pc: Pc) -> Result<(Pc, u16), BytecodeError> {
    let top = read_u32_le(image, pc as usize + 1, pc)?;
    let count = read_u16_le(image, pc as usize + 5, pc)?;
    Ok((top, count))
}

/// Will append a `BRANCH`/`BRANCH_LINKED` instruction (head byte + little-endian
/// 4-byte target) to `out`.
pub fn encode_branch(out: &mut Vec<u8>, tag: OpTag, condcode: ConditionCode, invert: bool, target: Pc) {
    out.push(encode_branch_head(tag, condcode, invert));
    out.extend_from_slice(&target.to_le_bytes());
}

/// Will append a `REPEAT` instruction (head byte + little-endian 4-byte
/// loop-top PC + little-endian 2-byte count) to `out`.
pub fn encode_repeat(out: &mut Vec<u8>, loop_top: Pc, count: u16) {
    out.push(encode_simple(OpTag::Repeat));
    out.extend_from_slice(&loop_top.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
}
