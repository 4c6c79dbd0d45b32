//! Python bindings for the bm3d-line streaming denoiser.
//!
//! This module exposes the high-level denoising API to Python via PyO3.

use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray2, PyReadonlyArray2, PyUntypedArrayMethods};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use bm3d_line::{
    Bm3dConfig as RustBm3dConfig, Bm3dError, Denoiser, DistanceMetric, GroupWeighting,
    NoiseParams, OwnedPlane, PlaneView, Precision, SearchWindow, Shrinkage,
};

/// Convert a Bm3dError to a Python exception.
fn to_py_err(err: Bm3dError) -> PyErr {
    PyRuntimeError::new_err(err.to_string())
}

fn parse_metric(metric: &str) -> PyResult<DistanceMetric> {
    match metric.to_lowercase().as_str() {
        "l2" | "squared_l2" => Ok(DistanceMetric::SquaredL2),
        "l1" | "absolute_l1" => Ok(DistanceMetric::AbsoluteL1),
        _ => Err(PyValueError::new_err("metric must be 'l2' or 'l1'")),
    }
}

fn parse_precision(precision: &str) -> PyResult<Precision> {
    match precision.to_lowercase().as_str() {
        "fixed" => Ok(Precision::Fixed),
        "float" => Ok(Precision::Float),
        _ => Err(PyValueError::new_err("precision must be 'fixed' or 'float'")),
    }
}

fn parse_weighting(weighting: &str) -> PyResult<GroupWeighting> {
    match weighting.to_lowercase().as_str() {
        "uniform" => Ok(GroupWeighting::Uniform),
        "inverse_nonzero" => Ok(GroupWeighting::InverseNonzero),
        _ => Err(PyValueError::new_err(
            "weighting must be 'uniform' or 'inverse_nonzero'",
        )),
    }
}

/// Denoiser configuration shared by every call that uses it.
#[pyclass]
#[derive(Clone)]
pub struct Bm3dConfig {
    inner: RustBm3dConfig,
}

#[pymethods]
impl Bm3dConfig {
    /// Create a new Bm3dConfig. Image size is taken from the array at call time.
    ///
    /// Args:
    ///     max_group_size: Maximum patches per group (default: 16)
    ///     patch_step: Distance between reference patches (default: 3)
    ///     search_radius: Block-matching radius on both axes (default: 16)
    ///     search_step: Block-matching step on both axes (default: 1)
    ///     metric: "l2" or "l1" (default: "l2")
    ///     precision: "fixed" or "float" (default: "fixed")
    ///     weighting: "uniform" or "inverse_nonzero" (default: "uniform")
    ///     bit_depth: Bits per input sample (default: 8)
    ///     parallel: Enable parallel distance updates (default: False)
    #[new]
    #[pyo3(signature = (
        max_group_size = 16,
        patch_step = 3,
        search_radius = 16,
        search_step = 1,
        metric = "l2",
        precision = "fixed",
        weighting = "uniform",
        bit_depth = 8,
        parallel = false
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        max_group_size: usize,
        patch_step: usize,
        search_radius: usize,
        search_step: usize,
        metric: &str,
        precision: &str,
        weighting: &str,
        bit_depth: u32,
        parallel: bool,
    ) -> PyResult<Self> {
        let inner = RustBm3dConfig {
            max_group_size,
            patch_step,
            search: SearchWindow {
                radius_h: search_radius,
                step_h: search_step,
                radius_v: search_radius,
                step_v: search_step,
            },
            metric: parse_metric(metric)?,
            precision: parse_precision(precision)?,
            weighting: parse_weighting(weighting)?,
            bit_depth,
            parallel,
            ..RustBm3dConfig::new(8, 8)
        };
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    fn __repr__(&self) -> String {
        format!(
            "Bm3dConfig(max_group_size={}, patch_step={}, search_radius={}, precision='{}', bit_depth={})",
            self.inner.max_group_size,
            self.inner.patch_step,
            self.inner.search.radius_h,
            match self.inner.precision {
                Precision::Fixed => "fixed",
                Precision::Float => "float",
            },
            self.inner.bit_depth
        )
    }
}

fn plane_from_array<T>(array: &PyReadonlyArray2<'_, T>) -> PyResult<OwnedPlane>
where
    T: numpy::Element + Copy + Into<u16>,
{
    let shape = array.shape();
    let height = shape[0];
    let width = shape[1];
    let data = array.as_slice()?;
    let view = PlaneView::from_slice(data, width, height).map_err(to_py_err)?;
    OwnedPlane::from_view(view).map_err(to_py_err)
}

fn run(
    config: Option<Bm3dConfig>,
    noisy: OwnedPlane,
    basic: Option<OwnedPlane>,
    sigma: f64,
) -> PyResult<OwnedPlane> {
    let base = config.map(|c| c.inner).unwrap_or_default();
    let shrinkage = if basic.is_some() {
        Shrinkage::Wiener
    } else {
        Shrinkage::HardThreshold
    };
    let cfg = RustBm3dConfig {
        width: noisy.width(),
        height: noisy.height(),
        shrinkage,
        ..base
    };
    let mut denoiser = Denoiser::new(cfg).map_err(to_py_err)?;
    let noise = NoiseParams::new(sigma);
    let out = match &basic {
        Some(basic) => denoiser.denoise(&[noisy.view()], Some(&[basic.view()]), &noise),
        None => denoiser.denoise(&[noisy.view()], None, &noise),
    }
    .map_err(to_py_err)?;
    out.into_iter()
        .next()
        .ok_or_else(|| PyRuntimeError::new_err("denoiser returned no planes"))
}

fn to_array<'py>(py: Python<'py>, plane: OwnedPlane) -> PyResult<Bound<'py, PyArray2<u16>>> {
    let (width, height) = (plane.width(), plane.height());
    let array = Array2::from_shape_vec((height, width), plane.into_vec())
        .map_err(|err| PyRuntimeError::new_err(err.to_string()))?;
    Ok(array.into_pyarray(py))
}

/// Denoise an 8-bit grayscale image.
///
/// Args:
///     noisy: 2D uint8 numpy array (height x width)
///     sigma: Noise standard deviation
///     basic: Optional 2D uint8 basic estimate; enables Wiener shrinkage
///     config: Bm3dConfig (default: Bm3dConfig())
///
/// Returns:
///     2D uint16 numpy array with the denoised samples
#[pyfunction]
#[pyo3(signature = (noisy, sigma, basic = None, config = None))]
fn denoise<'py>(
    py: Python<'py>,
    noisy: PyReadonlyArray2<'py, u8>,
    sigma: f64,
    basic: Option<PyReadonlyArray2<'py, u8>>,
    config: Option<Bm3dConfig>,
) -> PyResult<Bound<'py, PyArray2<u16>>> {
    let noisy = plane_from_array(&noisy)?;
    let basic = basic.as_ref().map(plane_from_array).transpose()?;
    let out = py.detach(|| run(config, noisy, basic, sigma))?;
    to_array(py, out)
}

/// Denoise a high bit-depth grayscale image (set `bit_depth` in the config).
#[pyfunction]
#[pyo3(signature = (noisy, sigma, basic = None, config = None))]
fn denoise_u16<'py>(
    py: Python<'py>,
    noisy: PyReadonlyArray2<'py, u16>,
    sigma: f64,
    basic: Option<PyReadonlyArray2<'py, u16>>,
    config: Option<Bm3dConfig>,
) -> PyResult<Bound<'py, PyArray2<u16>>> {
    let noisy = plane_from_array(&noisy)?;
    let basic = basic.as_ref().map(plane_from_array).transpose()?;
    let out = py.detach(|| run(config, noisy, basic, sigma))?;
    to_array(py, out)
}

/// Run the hard-threshold pass and then the Wiener pass.
///
/// Args:
///     noisy: 2D uint8 numpy array (height x width)
///     sigma: Noise standard deviation for both passes
///     config: Bm3dConfig for the first pass (default: Bm3dConfig())
///     wiener_config: Bm3dConfig for the second pass (default: group size 32)
#[pyfunction]
#[pyo3(signature = (noisy, sigma, config = None, wiener_config = None))]
fn denoise_two_pass<'py>(
    py: Python<'py>,
    noisy: PyReadonlyArray2<'py, u8>,
    sigma: f64,
    config: Option<Bm3dConfig>,
    wiener_config: Option<Bm3dConfig>,
) -> PyResult<Bound<'py, PyArray2<u16>>> {
    let noisy = plane_from_array(&noisy)?;
    let wiener_config = wiener_config.unwrap_or_else(|| Bm3dConfig {
        inner: RustBm3dConfig::wiener(8, 8),
    });
    let out = py.detach(|| {
        let basic = run(config, noisy.clone(), None, sigma)?;
        run(Some(wiener_config), noisy, Some(basic), sigma)
    })?;
    to_array(py, out)
}

/// Python module for bm3d-line.
#[pymodule]
fn _bm3d_line(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Bm3dConfig>()?;
    m.add_function(wrap_pyfunction!(denoise, m)?)?;
    m.add_function(wrap_pyfunction!(denoise_u16, m)?)?;
    m.add_function(wrap_pyfunction!(denoise_two_pass, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
