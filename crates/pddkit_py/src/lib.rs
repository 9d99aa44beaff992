use pddkit_report::{
    C_FILE_NAME_REPORT, C_MIME_TYPE_XLSX, ReportError, SpecReportOptions,
    create_pivot_report_from_xlsx_bytes,
};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyBytes;
use tracing_subscriber::{EnvFilter, fmt};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "pddkit.report.v1";
const C_LOG_LEVEL_DEFAULT: &str = "info";

fn derive_py_err(err: ReportError) -> PyErr {
    if err.is_input_error() {
        PyValueError::new_err(err.to_string())
    } else {
        PyRuntimeError::new_err(err.to_string())
    }
}

/// Build the pivot report workbook from uploaded xlsx bytes.
///
/// Returns `(content, file_name, mime_type, warnings)`.
#[pyfunction]
#[pyo3(name = "create_pivot_report", signature = (data, sheet_name = None))]
fn create_pivot_report_py<'py>(
    py: Python<'py>,
    data: &[u8],
    sheet_name: Option<String>,
) -> PyResult<(Bound<'py, PyBytes>, String, String, Vec<String>)> {
    let mut cfg_options = SpecReportOptions::default();
    cfg_options.reader.sheet_name = sheet_name;

    let report = py
        .allow_threads(|| create_pivot_report_from_xlsx_bytes(data, &cfg_options))
        .map_err(derive_py_err)?;

    Ok((
        PyBytes::new(py, &report.content),
        report.file_name,
        report.mime_type,
        report.warnings,
    ))
}

/// Install a global fmt subscriber; `RUST_LOG` wins over `level`.
#[pyfunction]
#[pyo3(name = "init_logging", signature = (level = None))]
fn init_logging_py(level: Option<&str>) -> PyResult<()> {
    let c_level = level.unwrap_or(C_LOG_LEVEL_DEFAULT);
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(c_level)
            .map_err(|err| PyValueError::new_err(format!("Invalid log level {c_level:?}: {err}")))?,
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|err| PyRuntimeError::new_err(err.to_string()))?;
    tracing::debug!(level = c_level, "logging initialized");
    Ok(())
}

#[pymodule]
fn _pddkit_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_function(wrap_pyfunction!(create_pivot_report_py, module)?)?;
    module.add_function(wrap_pyfunction!(init_logging_py, module)?)?;
    module.add("FILE_NAME_REPORT", C_FILE_NAME_REPORT)?;
    module.add("MIME_TYPE_XLSX", C_MIME_TYPE_XLSX)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    Ok(())
}
