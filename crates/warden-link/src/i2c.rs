//! Linux I2C implementation of the register bus

use embedded_hal::i2c::I2c;
use linux_embedded_hal::I2cdev;
use std::path::Path;

use crate::{LinkError, LinkResult, RegisterBus};

/// Register bus over a Linux I2C character device
pub struct I2cBus {
    dev: I2cdev,
    address: u8,
}

impl I2cBus {
    /// Open the I2C character device. Fails when the device node is
    /// missing or inaccessible; an unresponsive controller is detected
    /// later by the presence handshake, not here.
    pub fn open(path: impl AsRef<Path>, address: u8) -> LinkResult<Self> {
        let dev = I2cdev::new(path.as_ref())
            .map_err(|e| LinkError::Open(format!("{}: {}", path.as_ref().display(), e)))?;

        Ok(Self { dev, address })
    }
}

impl RegisterBus for I2cBus {
    fn read_register(&mut self, register: u8) -> LinkResult<u8> {
        let mut buf = [0u8; 1];
        self.dev
            .write_read(self.address, &[register], &mut buf)
            .map_err(|e| LinkError::Io(format!("read register {:#04x}: {}", register, e)))?;
        Ok(buf[0])
    }

    fn write_register(&mut self, register: u8, payload: &[u8]) -> LinkResult<()> {
        let mut frame = Vec::with_capacity(1 + payload.len());
        frame.push(register);
        frame.extend_from_slice(payload);

        self.dev
            .write(self.address, &frame)
            .map_err(|e| LinkError::Io(format!("write register {:#04x}: {}", register, e)))
    }
}
