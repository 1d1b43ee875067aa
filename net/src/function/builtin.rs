//! Built-in handlers for the bit and register access functions
//!
//! Every handler validates the quantity first (`IllegalDataValue`) and the address range second
//! (`IllegalDataAddress`). Memory is only changed if both checks pass.

use crate::Exception;
use crate::frame::Frame;

use byteorder::{BigEndian, ByteOrder};
use memory::{Bank, Memory, Range};

const MAX_READ_BITS: usize = 2000;
const MAX_READ_REGISTERS: usize = 125;
const MAX_WRITE_BITS: usize = 1968;
const MAX_WRITE_REGISTERS: usize = 123;
const MAX_READ_WRITE_REGISTERS: usize = 121;

const COIL_ON: u16 = 0xFF00;
const COIL_OFF: u16 = 0x0000;

fn word(data: &[u8], offset: usize) -> Result<usize, Exception> {
    data.get(offset..offset + 2)
        .map(|bytes| BigEndian::read_u16(bytes) as usize)
        .ok_or(Exception::IllegalDataValue)
}

/// Start address and quantity of the request's range
fn range(data: &[u8], max: usize) -> Result<Range, Exception> {
    let address = word(data, 0)?;
    let quantity = word(data, 2)?;
    if !(1..=max).contains(&quantity) {
        return Err(Exception::IllegalDataValue);
    }
    Ok(Range::new(address, quantity))
}

fn check_fits<T>(bank: &Bank<T>, range: &Range) -> Result<(), Exception>
where
    T: Copy + Default + std::fmt::Debug,
{
    if range.fits(bank.len()) {
        Ok(())
    } else {
        Err(Exception::IllegalDataAddress)
    }
}

/// Payload after the byte count field, checked against the expected byte count
fn values(data: &[u8], offset: usize, expected: usize) -> Result<&[u8], Exception> {
    let count = *data.get(offset).ok_or(Exception::IllegalDataValue)? as usize;
    let values = &data[offset + 1..];
    if count != expected || values.len() != expected {
        return Err(Exception::IllegalDataValue);
    }
    Ok(values)
}

fn pack_bits(bits: &[bool]) -> Vec<u8> {
    let count = bits.len().div_ceil(8);
    let mut data = vec![0u8; 1 + count];
    data[0] = count as u8;
    for (i, _) in bits.iter().enumerate().filter(|(_, bit)| **bit) {
        data[1 + i / 8] |= 1 << (i % 8);
    }
    data
}

fn pack_words(words: &[u16]) -> Vec<u8> {
    let mut data = vec![0u8; 1 + 2 * words.len()];
    data[0] = (2 * words.len()) as u8;
    for (chunk, value) in data[1..].chunks_exact_mut(2).zip(words) {
        BigEndian::write_u16(chunk, *value);
    }
    data
}

fn unpack_words(bytes: &[u8]) -> Vec<u16> {
    bytes.chunks_exact(2).map(BigEndian::read_u16).collect()
}

fn read_bits(bank: &Bank<bool>, frame: &dyn Frame) -> Result<Vec<u8>, Exception> {
    let range = range(frame.data(), MAX_READ_BITS)?;
    let bits = bank
        .read(&range)
        .map_err(|_| Exception::IllegalDataAddress)?;
    Ok(pack_bits(bits))
}

fn read_words(bank: &Bank<u16>, frame: &dyn Frame) -> Result<Vec<u8>, Exception> {
    let range = range(frame.data(), MAX_READ_REGISTERS)?;
    let words = bank
        .read(&range)
        .map_err(|_| Exception::IllegalDataAddress)?;
    Ok(pack_words(words))
}

/// Function code 0x01
pub fn read_coils(memory: &mut Memory, frame: &dyn Frame) -> Result<Vec<u8>, Exception> {
    read_bits(memory.coils(), frame)
}

/// Function code 0x02
pub fn read_discrete_inputs(memory: &mut Memory, frame: &dyn Frame) -> Result<Vec<u8>, Exception> {
    read_bits(memory.discrete_inputs(), frame)
}

/// Function code 0x03
pub fn read_holding_registers(
    memory: &mut Memory,
    frame: &dyn Frame,
) -> Result<Vec<u8>, Exception> {
    read_words(memory.holding_registers(), frame)
}

/// Function code 0x04
pub fn read_input_registers(memory: &mut Memory, frame: &dyn Frame) -> Result<Vec<u8>, Exception> {
    read_words(memory.input_registers(), frame)
}

/// Function code 0x05, the value has to be either `0xFF00` or `0x0000`
pub fn write_single_coil(memory: &mut Memory, frame: &dyn Frame) -> Result<Vec<u8>, Exception> {
    let data = frame.data();
    let address = word(data, 0)?;
    let value = word(data, 2)? as u16;
    if value != COIL_ON && value != COIL_OFF {
        return Err(Exception::IllegalDataValue);
    }
    memory
        .coils_mut()
        .set(address, value == COIL_ON)
        .map_err(|_| Exception::IllegalDataAddress)?;
    Ok(data[..4].to_vec())
}

/// Function code 0x06
pub fn write_single_register(
    memory: &mut Memory,
    frame: &dyn Frame,
) -> Result<Vec<u8>, Exception> {
    let data = frame.data();
    let address = word(data, 0)?;
    let value = word(data, 2)? as u16;
    memory
        .holding_registers_mut()
        .set(address, value)
        .map_err(|_| Exception::IllegalDataAddress)?;
    Ok(data[..4].to_vec())
}

/// Function code 0x0F
pub fn write_multiple_coils(memory: &mut Memory, frame: &dyn Frame) -> Result<Vec<u8>, Exception> {
    let data = frame.data();
    let range = range(data, MAX_WRITE_BITS)?;
    let bytes = values(data, 4, range.length().div_ceil(8))?;
    check_fits(memory.coils(), &range)?;

    let bits: Vec<bool> = (0..range.length())
        .map(|i| (bytes[i / 8] >> (i % 8)) & 0x01 == 0x01)
        .collect();
    memory
        .coils_mut()
        .write(&range, &bits)
        .map_err(|_| Exception::IllegalDataAddress)?;
    Ok(data[..4].to_vec())
}

/// Function code 0x10
pub fn write_multiple_registers(
    memory: &mut Memory,
    frame: &dyn Frame,
) -> Result<Vec<u8>, Exception> {
    let data = frame.data();
    let range = range(data, MAX_WRITE_REGISTERS)?;
    let bytes = values(data, 4, 2 * range.length())?;
    check_fits(memory.holding_registers(), &range)?;

    memory
        .holding_registers_mut()
        .write(&range, &unpack_words(bytes))
        .map_err(|_| Exception::IllegalDataAddress)?;
    Ok(data[..4].to_vec())
}

/// Function code 0x17, the write is applied before the read
pub fn read_write_multiple_registers(
    memory: &mut Memory,
    frame: &dyn Frame,
) -> Result<Vec<u8>, Exception> {
    let data = frame.data();
    let read = range(data, MAX_READ_REGISTERS)?;
    let write = range(data.get(4..).unwrap_or_default(), MAX_READ_WRITE_REGISTERS)?;
    let bytes = values(data, 8, 2 * write.length())?;

    let registers = memory.holding_registers_mut();
    check_fits(registers, &read)?;
    check_fits(registers, &write)?;
    registers
        .write(&write, &unpack_words(bytes))
        .map_err(|_| Exception::IllegalDataAddress)?;
    let words = registers
        .read(&read)
        .map_err(|_| Exception::IllegalDataAddress)?;
    Ok(pack_words(words))
}
