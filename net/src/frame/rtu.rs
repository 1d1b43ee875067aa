use crate::frame::{EXCEPTION_FLAG, Frame, crc16};
use crate::{Exception, FrameError};

use byteorder::{ByteOrder, LittleEndian};

/// Address, function code and CRC
const MINIMUM_SIZE: usize = 4;

/// Modbus RTU frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtuFrame {
    pub address: u8,
    pub function: u8,
    pub data: Vec<u8>,
    pub crc: u16,
}

impl RtuFrame {
    pub fn new(address: u8, function: u8, data: Vec<u8>) -> Self {
        let mut frame = Self {
            address,
            function,
            data,
            crc: 0,
        };
        frame.crc = frame.checksum();
        frame
    }

    /// Parse a single frame from the given packet, the trailing CRC is verified
    pub fn parse(packet: &[u8]) -> Result<Self, FrameError> {
        if packet.len() < MINIMUM_SIZE {
            return Err(FrameError::TooShort {
                minimum: MINIMUM_SIZE,
                actual: packet.len(),
            });
        }

        let (body, crc) = packet.split_at(packet.len() - 2);
        let expected = LittleEndian::read_u16(crc);
        let computed = crc16(body);
        if expected != computed {
            return Err(FrameError::Checksum { expected, computed });
        }

        Ok(Self {
            address: body[0],
            function: body[1],
            data: body[2..].to_vec(),
            crc: expected,
        })
    }

    fn checksum(&self) -> u16 {
        let mut body = Vec::with_capacity(2 + self.data.len());
        body.push(self.address);
        body.push(self.function);
        body.extend_from_slice(&self.data);
        crc16(&body)
    }
}

impl Frame for RtuFrame {
    fn function(&self) -> u8 {
        self.function
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
        self.crc = self.checksum();
    }

    fn set_exception(&mut self, exception: Exception) {
        self.function |= EXCEPTION_FLAG;
        self.set_data(vec![exception.code()]);
    }

    fn reply(&self) -> Box<dyn Frame> {
        Box::new(self.clone())
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(MINIMUM_SIZE + self.data.len());
        bytes.push(self.address);
        bytes.push(self.function);
        bytes.extend_from_slice(&self.data);

        let mut crc = [0u8; 2];
        LittleEndian::write_u16(&mut crc, crc16(&bytes));
        bytes.extend_from_slice(&crc);
        bytes
    }
}
