use crate::bank::Bank;
use crate::config::{Config, Preset};
use crate::error::Error;

/// Memory of a Modbus slave
///
/// Coils and discrete inputs keep one bit of state per slot, holding and input registers one
/// 16-bit word per slot. All four banks span the full address space.
#[derive(Debug, Default, Clone)]
pub struct Memory {
    coils: Bank<bool>,
    discrete_inputs: Bank<bool>,
    holding_registers: Bank<u16>,
    input_registers: Bank<u16>,
}

impl Memory {
    /// Create a zeroed memory and apply all presets of the given configuration
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let mut memory = Self::default();
        memory.apply(config)?;
        Ok(memory)
    }

    pub fn apply(&mut self, config: &Config) -> Result<(), Error> {
        for preset in config.coils.iter() {
            Self::apply_bits(&mut self.coils, preset)?;
        }
        for preset in config.discrete_inputs.iter() {
            Self::apply_bits(&mut self.discrete_inputs, preset)?;
        }
        for preset in config.holding_registers.iter() {
            self.holding_registers
                .write(&preset.range(), &preset.values)?;
        }
        for preset in config.input_registers.iter() {
            self.input_registers.write(&preset.range(), &preset.values)?;
        }
        Ok(())
    }

    fn apply_bits(bank: &mut Bank<bool>, preset: &Preset) -> Result<(), Error> {
        let bits: Vec<bool> = preset.values.iter().map(|v| *v != 0).collect();
        bank.write(&preset.range(), &bits)
    }

    pub fn coils(&self) -> &Bank<bool> {
        &self.coils
    }

    pub fn coils_mut(&mut self) -> &mut Bank<bool> {
        &mut self.coils
    }

    pub fn discrete_inputs(&self) -> &Bank<bool> {
        &self.discrete_inputs
    }

    pub fn discrete_inputs_mut(&mut self) -> &mut Bank<bool> {
        &mut self.discrete_inputs
    }

    pub fn holding_registers(&self) -> &Bank<u16> {
        &self.holding_registers
    }

    pub fn holding_registers_mut(&mut self) -> &mut Bank<u16> {
        &mut self.holding_registers
    }

    pub fn input_registers(&self) -> &Bank<u16> {
        &self.input_registers
    }

    pub fn input_registers_mut(&mut self) -> &mut Bank<u16> {
        &mut self.input_registers
    }
}

#[cfg(test)]
mod tests {
    use crate::{Config, Error, Memory, Preset, Range};

    #[test]
    fn ut_memory_default() {
        let memory = Memory::default();
        assert_eq!(memory.coils().len(), 65536);
        assert_eq!(memory.discrete_inputs().len(), 65536);
        assert_eq!(memory.holding_registers().len(), 65536);
        assert_eq!(memory.input_registers().len(), 65536);
    }

    #[test]
    fn ut_memory_banks_are_independent() {
        let mut memory = Memory::default();
        memory.holding_registers_mut().set(10, 0x1234).unwrap();
        memory.coils_mut().set(10, true).unwrap();

        assert_eq!(memory.input_registers().get(10), Ok(0));
        assert_eq!(memory.discrete_inputs().get(10), Ok(false));
        assert_eq!(memory.holding_registers().get(10), Ok(0x1234));
        assert_eq!(
            memory.coils().read(&Range::new(9, 2)),
            Ok(&[false, true][..])
        );
    }

    #[test]
    fn ut_memory_from_config() {
        let config = Config {
            coils: vec![Preset::new(0, vec![1, 0, 1])],
            discrete_inputs: vec![],
            holding_registers: vec![Preset::new(100, vec![0xAAAA, 0xBBBB])],
            input_registers: vec![Preset::new(5, vec![7])],
        };
        let memory = Memory::from_config(&config).unwrap();
        assert_eq!(
            memory.coils().read(&Range::new(0, 3)),
            Ok(&[true, false, true][..])
        );
        assert_eq!(
            memory.holding_registers().read(&Range::new(100, 2)),
            Ok(&[0xAAAA, 0xBBBB][..])
        );
        assert_eq!(memory.input_registers().get(5), Ok(7));
    }

    #[test]
    fn ut_memory_from_config_out_of_bounds() {
        let config = Config {
            holding_registers: vec![Preset::new(65535, vec![1, 2])],
            ..Default::default()
        };
        assert_eq!(
            Memory::from_config(&config).err(),
            Some(Error::OutOfBounds(Range::new(65535, 2)))
        );
    }

    #[test]
    fn ut_memory_from_config_address_overflow() {
        let config = Config {
            coils: vec![Preset::new(usize::MAX, vec![1])],
            ..Default::default()
        };
        assert_eq!(
            Memory::from_config(&config).err(),
            Some(Error::OutOfBounds(Range::new(usize::MAX, 1)))
        );
    }
}
