use crate::frame::{EXCEPTION_FLAG, Frame};
use crate::{Exception, FrameError};

use byteorder::{BigEndian, ByteOrder};

/// MBAP header (7 bytes) plus the function code
const MINIMUM_SIZE: usize = 8;

/// Modbus TCP frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpFrame {
    pub transaction_id: u16,
    pub protocol_id: u16,
    pub length: u16,
    pub unit_id: u8,
    pub function: u8,
    pub data: Vec<u8>,
}

impl TcpFrame {
    pub fn new(transaction_id: u16, unit_id: u8, function: u8, data: Vec<u8>) -> Self {
        Self {
            transaction_id,
            protocol_id: 0,
            length: (data.len() + 2) as u16,
            unit_id,
            function,
            data,
        }
    }

    /// Parse a single frame from the given packet
    ///
    /// The length field of the MBAP header has to match the number of bytes following it.
    pub fn parse(packet: &[u8]) -> Result<Self, FrameError> {
        if packet.len() < MINIMUM_SIZE {
            return Err(FrameError::TooShort {
                minimum: MINIMUM_SIZE,
                actual: packet.len(),
            });
        }

        let frame = Self {
            transaction_id: BigEndian::read_u16(&packet[0..2]),
            protocol_id: BigEndian::read_u16(&packet[2..4]),
            length: BigEndian::read_u16(&packet[4..6]),
            unit_id: packet[6],
            function: packet[7],
            data: packet[MINIMUM_SIZE..].to_vec(),
        };

        if frame.length as usize != frame.data.len() + 2 {
            return Err(FrameError::LengthMismatch {
                declared: frame.length as usize,
                actual: frame.data.len() + 2,
            });
        }

        Ok(frame)
    }
}

impl Frame for TcpFrame {
    fn function(&self) -> u8 {
        self.function
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn set_data(&mut self, data: Vec<u8>) {
        self.length = (data.len() + 2) as u16;
        self.data = data;
    }

    fn set_exception(&mut self, exception: Exception) {
        self.function |= EXCEPTION_FLAG;
        self.set_data(vec![exception.code()]);
    }

    fn reply(&self) -> Box<dyn Frame> {
        Box::new(self.clone())
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut header = [0u8; MINIMUM_SIZE];
        BigEndian::write_u16(&mut header[0..2], self.transaction_id);
        BigEndian::write_u16(&mut header[2..4], self.protocol_id);
        BigEndian::write_u16(&mut header[4..6], (self.data.len() + 2) as u16);
        header[6] = self.unit_id;
        header[7] = self.function;

        let mut bytes = Vec::with_capacity(MINIMUM_SIZE + self.data.len());
        bytes.extend_from_slice(&header);
        bytes.extend_from_slice(&self.data);
        bytes
    }
}
