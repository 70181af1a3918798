pub mod assembly_telemetry;
pub mod positional_exporter;
