//! Blocking front end: the same operations as [`crate::Client`], each one
//! driven to completion on an owned current-thread runtime.

use tokio::runtime::{Builder, Runtime};

use crate::client::{ArrayView, Client as AsyncClient};
use crate::config::Options;
use crate::error::{ClientError, Result};

pub struct Client {
    inner: AsyncClient,
    runtime: Runtime,
}

impl Client {
    pub fn new(options: Options) -> Result<Client> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build runtime: {e}")))?;
        Ok(Client {
            inner: AsyncClient::new(options),
            runtime,
        })
    }

    pub fn read_float(&self, address: &str) -> Result<f32> {
        self.runtime.block_on(self.inner.read_float(address))
    }

    pub fn write_float(&self, address: &str, value: f32) -> Result<()> {
        self.runtime.block_on(self.inner.write_float(address, value))
    }

    pub fn read_dint(&self, address: &str) -> Result<i32> {
        self.runtime.block_on(self.inner.read_dint(address))
    }

    pub fn write_dint(&self, address: &str, value: i32) -> Result<()> {
        self.runtime.block_on(self.inner.write_dint(address, value))
    }

    pub fn read_float_array(&self, address: &str, count: usize) -> Result<ArrayView<f32>> {
        self.runtime
            .block_on(self.inner.read_float_array(address, count))
    }

    pub fn write_float_array(&self, address: &str, values: &[f32]) -> Result<()> {
        self.runtime
            .block_on(self.inner.write_float_array(address, values))
    }

    pub fn read_dint_array(&self, address: &str, count: usize) -> Result<ArrayView<i32>> {
        self.runtime
            .block_on(self.inner.read_dint_array(address, count))
    }

    pub fn write_dint_array(&self, address: &str, values: &[i32]) -> Result<()> {
        self.runtime
            .block_on(self.inner.write_dint_array(address, values))
    }

    pub fn write_bool(&self, address: &str, value: bool) -> Result<()> {
        self.runtime.block_on(self.inner.write_bool(address, value))
    }

    pub fn read_bool_array(&self, address: &str, count: usize) -> Result<ArrayView<bool>> {
        self.runtime
            .block_on(self.inner.read_bool_array(address, count))
    }

    pub fn write_bool_array(&self, address: &str, values: &[bool]) -> Result<()> {
        self.runtime
            .block_on(self.inner.write_bool_array(address, values))
    }

    pub fn read_string(&self, address: &str) -> Result<String> {
        self.runtime.block_on(self.inner.read_string(address))
    }

    pub fn write_string(&self, address: &str, value: &str) -> Result<()> {
        self.runtime
            .block_on(self.inner.write_string(address, value))
    }

    pub fn read_string_array(&self, address: &str, count: usize) -> Result<ArrayView<String>> {
        self.runtime
            .block_on(self.inner.read_string_array(address, count))
    }

    pub fn write_string_array(&self, address: &str, values: &[&str]) -> Result<()> {
        self.runtime
            .block_on(self.inner.write_string_array(address, values))
    }

    pub fn close(&self) {
        self.runtime.block_on(self.inner.close());
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.runtime.block_on(self.inner.close());
    }
}
