mod crc;
mod rtu;
mod tcp;

pub use crc::crc16;
pub use rtu::RtuFrame;
pub use tcp::TcpFrame;

use crate::Exception;
use std::fmt::Debug;

/// Bit set in the function code of every exception response
pub const EXCEPTION_FLAG: u8 = 0x80;

/// Transport independent view of a single request or response
///
/// The dispatcher only relies on this trait, the encoding of addressing and checksums is left to
/// the concrete frame type.
pub trait Frame: Debug + Send + Sync {
    fn function(&self) -> u8;

    fn data(&self) -> &[u8];

    fn set_data(&mut self, data: Vec<u8>);

    /// Turn the frame into an exception response, any previous payload is dropped
    fn set_exception(&mut self, exception: Exception);

    /// Copy of the frame keeping the transport header, used to build the response
    fn reply(&self) -> Box<dyn Frame>;

    fn to_bytes(&self) -> Vec<u8>;

    fn exception(&self) -> Option<Exception> {
        if self.function() & EXCEPTION_FLAG == 0 {
            return None;
        }
        self.data()
            .first()
            .and_then(|code| Exception::from_code(*code))
    }
}
