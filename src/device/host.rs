use crate::device::device::{CompiledProgram, DeviceBackend, DeviceContext, ProgramBody, ProgramSource};
use crate::foundation::error::{MedflowError, MedflowResult};

/// Backend for the host CPU. Work runs inline on the calling thread, so `finish` has nothing to
/// wait for.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostBackend;

impl DeviceBackend for HostBackend {
    fn compile(
        &self,
        source: &ProgramSource,
        _build_options: &str,
    ) -> MedflowResult<CompiledProgram> {
        match &source.body {
            ProgramBody::Host => Ok(CompiledProgram::Host),
            ProgramBody::Wgsl(_) => Err(MedflowError::unsupported(format!(
                "host device cannot compile WGSL program '{}'",
                source.id
            ))),
        }
    }

    fn finish(&self) -> MedflowResult<()> {
        Ok(())
    }

    fn context(&self) -> DeviceContext<'_> {
        DeviceContext::Host
    }
}
