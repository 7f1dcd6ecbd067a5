//! Image and data export through chart scripts
//!
//! Export is an ordinary run with extra properties that tell the script
//! what to write and where. Afterwards the runner checks that the expected
//! file exists.

use super::run::ChartRunner;
use super::{RunError, RunResult};
use crate::document::{Analysis, Chart, Properties};
use crate::workspace::WorkspaceResolver;
use std::path::{Path, PathBuf};

pub const EXPORT_IMAGE: &str = "export_image";
pub const IMAGE_EXPORT_FORMAT: &str = "image_export_format";
pub const IMAGE_EXPORT_FOLDER: &str = "image_export_folder";
pub const IMAGE_EXPORT_FILENAME: &str = "image_export_filename";
pub const IMAGE_EXPORT_WIDTH: &str = "image_export_width";
pub const IMAGE_EXPORT_HEIGHT: &str = "image_export_height";
pub const IMAGE_EXPORT_DPI: &str = "image_export_dpi";

pub const EXPORT_DATA: &str = "export_data";
pub const DATA_EXPORT_FORMAT: &str = "data_export_format";
pub const DATA_EXPORT_FOLDER: &str = "data_export_folder";
pub const DATA_EXPORT_FILENAME: &str = "data_export_filename";

const DEFAULT_IMAGE_FORMAT: &str = "svg";
const DEFAULT_DATA_FORMAT: &str = "csv";

/// What an export produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Image,
    Data,
}

impl std::fmt::Display for ExportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportKind::Image => f.write_str("image"),
            ExportKind::Data => f.write_str("data"),
        }
    }
}

/// Image export settings. `None` fields add no property, leaving the
/// chart's own setting (or the script's default) in effect.
#[derive(Debug, Clone)]
pub struct ImageExportOptions {
    pub format: Option<String>,
    pub target_folder: Option<PathBuf>,
    pub filename: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub dpi: Option<u32>,
    /// Fail if the image is missing after the run; otherwise warn
    pub enforce: bool,
    pub extra_properties: Properties,
}

impl Default for ImageExportOptions {
    fn default() -> Self {
        Self {
            format: None,
            target_folder: None,
            filename: None,
            width: None,
            height: None,
            dpi: None,
            enforce: true,
            extra_properties: Properties::new(),
        }
    }
}

impl ImageExportOptions {
    fn properties(&self) -> Properties {
        let mut props = self.extra_properties.clone();
        props.insert(EXPORT_IMAGE.into(), "true".into());
        set_if_some(&mut props, IMAGE_EXPORT_FORMAT, self.format.as_ref());
        set_if_some(
            &mut props,
            IMAGE_EXPORT_FOLDER,
            self.target_folder.as_ref().map(|p| p.display()),
        );
        set_if_some(&mut props, IMAGE_EXPORT_FILENAME, self.filename.as_ref());
        set_if_some(&mut props, IMAGE_EXPORT_WIDTH, self.width);
        set_if_some(&mut props, IMAGE_EXPORT_HEIGHT, self.height);
        set_if_some(&mut props, IMAGE_EXPORT_DPI, self.dpi);
        props
    }
}

/// Data export settings; see [`ImageExportOptions`]
#[derive(Debug, Clone)]
pub struct DataExportOptions {
    pub format: Option<String>,
    pub target_folder: Option<PathBuf>,
    pub filename: Option<String>,
    pub enforce: bool,
    pub extra_properties: Properties,
}

impl Default for DataExportOptions {
    fn default() -> Self {
        Self {
            format: None,
            target_folder: None,
            filename: None,
            enforce: true,
            extra_properties: Properties::new(),
        }
    }
}

impl DataExportOptions {
    fn properties(&self) -> Properties {
        let mut props = self.extra_properties.clone();
        props.insert(EXPORT_DATA.into(), "true".into());
        set_if_some(&mut props, DATA_EXPORT_FORMAT, self.format.as_ref());
        set_if_some(
            &mut props,
            DATA_EXPORT_FOLDER,
            self.target_folder.as_ref().map(|p| p.display()),
        );
        set_if_some(&mut props, DATA_EXPORT_FILENAME, self.filename.as_ref());
        props
    }
}

fn set_if_some(props: &mut Properties, key: &str, value: Option<impl ToString>) {
    if let Some(value) = value {
        props.insert(key.to_string(), value.to_string());
    }
}

/// Where an image export is written, relative to the working directory
pub fn image_export_filepath(props: &Properties, chart_name: &str) -> PathBuf {
    export_filepath(
        props,
        chart_name,
        IMAGE_EXPORT_FORMAT,
        IMAGE_EXPORT_FOLDER,
        IMAGE_EXPORT_FILENAME,
        DEFAULT_IMAGE_FORMAT,
    )
}

/// Where a data export is written, relative to the working directory
pub fn data_export_filepath(props: &Properties, chart_name: &str) -> PathBuf {
    export_filepath(
        props,
        chart_name,
        DATA_EXPORT_FORMAT,
        DATA_EXPORT_FOLDER,
        DATA_EXPORT_FILENAME,
        DEFAULT_DATA_FORMAT,
    )
}

fn export_filepath(
    props: &Properties,
    chart_name: &str,
    format_key: &str,
    folder_key: &str,
    filename_key: &str,
    default_format: &str,
) -> PathBuf {
    let non_empty = |key: &str| props.get(key).map(String::as_str).filter(|v| !v.is_empty());

    let format = non_empty(format_key).unwrap_or(default_format);
    let folder = non_empty(folder_key).unwrap_or(".");
    let filename = match non_empty(filename_key) {
        Some(name) => name.to_string(),
        None => sanitize_filename(chart_name),
    };

    let suffix = format!(".{format}");
    let filename = if filename.ends_with(&suffix) {
        filename
    } else {
        filename + &suffix
    };
    Path::new(folder).join(filename)
}

/// Turn a chart name into a file name: anything outside `[A-Za-z0-9._-]`
/// becomes `_`, and an empty name becomes `chart`.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "chart".to_string()
    } else {
        sanitized
    }
}

fn check_file_created(path: PathBuf, kind: ExportKind, enforce: bool) -> RunResult<Option<PathBuf>> {
    if path.is_file() {
        return Ok(Some(path));
    }
    if enforce {
        return Err(RunError::ExportFailure { kind, path });
    }
    tracing::warn!(
        path = %path.display(),
        "Chart script silently failed to create {} file",
        kind
    );
    Ok(None)
}

impl ChartRunner {
    /// Run a chart to export its image.
    ///
    /// Returns the image path, or `None` if it is missing and
    /// `options.enforce` is off.
    pub fn export_image(
        &mut self,
        analysis: &Analysis,
        chart: &Chart,
        working_dir: &Path,
        resolver: &dyn WorkspaceResolver,
        options: &ImageExportOptions,
    ) -> RunResult<Option<PathBuf>> {
        let extra = options.properties();
        self.run(analysis, chart, working_dir, resolver, &extra, false)?;

        let path = image_export_filepath(&effective_properties(chart, extra), &chart.name);
        check_file_created(working_dir.join(path), ExportKind::Image, options.enforce)
    }

    /// Run a chart to export its data; see [`ChartRunner::export_image`]
    pub fn export_data(
        &mut self,
        analysis: &Analysis,
        chart: &Chart,
        working_dir: &Path,
        resolver: &dyn WorkspaceResolver,
        options: &DataExportOptions,
    ) -> RunResult<Option<PathBuf>> {
        let extra = options.properties();
        self.run(analysis, chart, working_dir, resolver, &extra, false)?;

        let path = data_export_filepath(&effective_properties(chart, extra), &chart.name);
        check_file_created(working_dir.join(path), ExportKind::Data, options.enforce)
    }
}

fn effective_properties(chart: &Chart, extra: Properties) -> Properties {
    let mut props = chart.properties.clone();
    props.extend(extra);
    props
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn unset_options_inject_no_keys() {
        let options = ImageExportOptions::default();
        let injected = options.properties();
        assert_eq!(injected, props(&[("export_image", "true")]));

        let injected = DataExportOptions::default().properties();
        assert_eq!(injected, props(&[("export_data", "true")]));
    }

    #[test]
    fn set_options_are_stringified() {
        let options = ImageExportOptions {
            format: Some("png".into()),
            target_folder: Some(PathBuf::from("out")),
            filename: Some("fig".into()),
            width: Some(6.5),
            height: Some(4.0),
            dpi: Some(150),
            ..Default::default()
        };
        let injected = options.properties();
        assert_eq!(injected.get(IMAGE_EXPORT_FORMAT).map(String::as_str), Some("png"));
        assert_eq!(injected.get(IMAGE_EXPORT_FOLDER).map(String::as_str), Some("out"));
        assert_eq!(injected.get(IMAGE_EXPORT_FILENAME).map(String::as_str), Some("fig"));
        assert_eq!(injected.get(IMAGE_EXPORT_WIDTH).map(String::as_str), Some("6.5"));
        assert_eq!(injected.get(IMAGE_EXPORT_HEIGHT).map(String::as_str), Some("4"));
        assert_eq!(injected.get(IMAGE_EXPORT_DPI).map(String::as_str), Some("150"));
    }

    #[test]
    fn extra_properties_lose_to_explicit_options() {
        let options = DataExportOptions {
            format: Some("json".into()),
            extra_properties: props(&[("data_export_format", "csv"), ("title", "x")]),
            ..Default::default()
        };
        let injected = options.properties();
        assert_eq!(injected.get(DATA_EXPORT_FORMAT).map(String::as_str), Some("json"));
        assert_eq!(injected.get("title").map(String::as_str), Some("x"));
    }

    #[test]
    fn image_path_defaults_to_sanitized_chart_name() {
        let path = image_export_filepath(&Properties::new(), "Mean delay / host[0]");
        assert_eq!(path, PathBuf::from("./Mean_delay___host_0_.svg"));
    }

    #[test]
    fn image_path_uses_properties() {
        let p = props(&[
            ("image_export_format", "png"),
            ("image_export_folder", "figures"),
            ("image_export_filename", "delay"),
        ]);
        assert_eq!(image_export_filepath(&p, "ignored"), PathBuf::from("figures/delay.png"));
    }

    #[test]
    fn existing_extension_is_not_repeated() {
        let p = props(&[("data_export_filename", "table.csv")]);
        assert_eq!(data_export_filepath(&p, "x"), PathBuf::from("./table.csv"));
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let p = props(&[("data_export_format", ""), ("data_export_filename", "")]);
        assert_eq!(data_export_filepath(&p, ""), PathBuf::from("./chart.csv"));
    }

    #[test]
    fn missing_file_respects_enforce() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.svg");

        let err = check_file_created(path.clone(), ExportKind::Image, true).unwrap_err();
        assert!(matches!(err, RunError::ExportFailure { kind: ExportKind::Image, .. }));
        assert!(err.to_string().contains("image file"));

        assert_eq!(check_file_created(path, ExportKind::Image, false).unwrap(), None);
    }

    #[test]
    fn present_file_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "a,b\n").unwrap();
        assert_eq!(
            check_file_created(path.clone(), ExportKind::Data, true).unwrap(),
            Some(path)
        );
    }
}
