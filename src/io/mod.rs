// Purpose - external interfaces: OS audio output, sample formats, capture.

pub mod capture;
pub mod device;
pub mod quantize;
pub mod sink;

pub use device::output_devices;
pub use quantize::SampleFormat;
pub use sink::{AudioSink, Completion, SubmitError};
