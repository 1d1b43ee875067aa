pub mod builtin;

use crate::Exception;
use crate::frame::Frame;

use memory::Memory;
use std::fmt::Debug;
use std::sync::Arc;

pub const READ_COILS: u8 = 0x01;
pub const READ_DISCRETE_INPUTS: u8 = 0x02;
pub const READ_HOLDING_REGISTERS: u8 = 0x03;
pub const READ_INPUT_REGISTERS: u8 = 0x04;
pub const WRITE_SINGLE_COIL: u8 = 0x05;
pub const WRITE_SINGLE_REGISTER: u8 = 0x06;
pub const WRITE_MULTIPLE_COILS: u8 = 0x0F;
pub const WRITE_MULTIPLE_REGISTERS: u8 = 0x10;
pub const READ_WRITE_MULTIPLE_REGISTERS: u8 = 0x17;

/// Function handler
///
/// A handler is a pure function of the memory and the request frame. It returns the payload of
/// the response or the exception to report. It must validate addresses and quantities itself and
/// must not hand the memory to any other task.
pub type Handler =
    Arc<dyn Fn(&mut Memory, &dyn Frame) -> Result<Vec<u8>, Exception> + Send + Sync + 'static>;

/// Dense table of handlers indexed by the function code
pub struct FunctionTable {
    handlers: [Option<Handler>; 256],
}

impl Debug for FunctionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let codes: Vec<u8> = (0..=255u8).filter(|c| self.is_registered(*c)).collect();
        f.debug_struct("FunctionTable")
            .field("registered", &codes)
            .finish()
    }
}

impl Default for FunctionTable {
    /// Table with all built-in handlers installed
    fn default() -> Self {
        let mut table = Self::empty();
        table.register(READ_COILS, builtin::read_coils);
        table.register(READ_DISCRETE_INPUTS, builtin::read_discrete_inputs);
        table.register(READ_HOLDING_REGISTERS, builtin::read_holding_registers);
        table.register(READ_INPUT_REGISTERS, builtin::read_input_registers);
        table.register(WRITE_SINGLE_COIL, builtin::write_single_coil);
        table.register(WRITE_SINGLE_REGISTER, builtin::write_single_register);
        table.register(WRITE_MULTIPLE_COILS, builtin::write_multiple_coils);
        table.register(WRITE_MULTIPLE_REGISTERS, builtin::write_multiple_registers);
        table.register(
            READ_WRITE_MULTIPLE_REGISTERS,
            builtin::read_write_multiple_registers,
        );
        table
    }
}

impl FunctionTable {
    pub fn empty() -> Self {
        Self {
            handlers: std::array::from_fn(|_| None),
        }
    }

    /// Install or replace the handler of the given function code
    pub fn register<F>(&mut self, code: u8, handler: F) -> Option<Handler>
    where
        F: Fn(&mut Memory, &dyn Frame) -> Result<Vec<u8>, Exception> + Send + Sync + 'static,
    {
        self.register_handler(code, Arc::new(handler))
    }

    pub fn register_handler(&mut self, code: u8, handler: Handler) -> Option<Handler> {
        self.handlers[code as usize].replace(handler)
    }

    pub fn remove(&mut self, code: u8) -> Option<Handler> {
        self.handlers[code as usize].take()
    }

    pub fn get(&self, code: u8) -> Option<Handler> {
        self.handlers[code as usize].clone()
    }

    pub fn is_registered(&self, code: u8) -> bool {
        self.handlers[code as usize].is_some()
    }

}
