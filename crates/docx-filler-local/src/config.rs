use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docx_filler_core::{DateFormat, ExportType, FillOptions, KeyKind, Occurrences, TokenStyle};

use crate::service::ServiceSettings;

/// Configuration for the docx-filler command line tool.
#[derive(Parser, Debug, Clone)]
#[command(name = "docx-filler")]
#[command(about = "Fill DOCX templates with item values from a local data directory")]
pub struct Config {
    /// Directory holding `lists/` and `libraries/`
    #[arg(long, default_value = "./data", env = "DOCX_FILLER_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Library containing the templates
    #[arg(long, env = "DOCX_FILLER_TEMPLATE_LIBRARY")]
    pub template_library: String,

    /// List holding the items used to fill templates
    #[arg(long, env = "DOCX_FILLER_TARGET_LIST")]
    pub target_list: String,

    /// Token style: {token}, [token], <token>, _token_ or any
    #[arg(long, default_value = "{token}", env = "DOCX_FILLER_TOKEN_STYLE")]
    pub token_style: TokenStyle,

    /// Match tokens against field display names instead of internal names
    #[arg(long, env = "DOCX_FILLER_USE_DISPLAY_NAMES")]
    pub use_display_names: bool,

    /// Replace every token of a field in a paragraph, not only the first
    #[arg(long)]
    pub all_occurrences: bool,

    /// Where filled documents go: download, attachment or library_file
    #[arg(long, default_value = "download", env = "DOCX_FILLER_EXPORT_TYPE")]
    pub export_type: ExportType,

    /// Extension appended to produced file names
    #[arg(long, default_value = ".docx")]
    pub export_format: String,

    /// File name template for downloads and attachments, e.g. "Offer {item:Title}"
    #[arg(long, default_value = "{item:Title}", env = "DOCX_FILLER_EXPORT_FILENAME")]
    pub export_filename: String,

    /// Path template inside the template library for library files
    #[arg(long, default_value = "Generated/{item:Title}", env = "DOCX_FILLER_EXPORT_PATH")]
    pub export_path: String,

    /// Directory receiving downloaded documents
    #[arg(long, default_value = ".", env = "DOCX_FILLER_DOWNLOAD_DIR")]
    pub download_dir: PathBuf,

    /// Locale used for date/time values
    #[arg(long, default_value = "en_US", env = "DOCX_FILLER_LOCALE")]
    pub locale: String,

    /// strftime pattern used for date/time values
    #[arg(long, default_value = "%x %X", env = "DOCX_FILLER_DATE_PATTERN")]
    pub date_pattern: String,

    /// Package part holding the document text
    #[arg(long, default_value = "word/document.xml")]
    pub content_part: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the .docx templates of the template library
    Templates,

    /// Fill one template with one item and store the result
    Fill {
        /// Template file name
        #[arg(long)]
        template: String,

        /// Item identifier in the target list
        #[arg(long)]
        item: String,
    },
}

impl Config {
    pub fn fill_options(&self) -> Result<FillOptions, String> {
        Ok(FillOptions {
            match_by: if self.use_display_names {
                KeyKind::DisplayTitle
            } else {
                KeyKind::InternalName
            },
            token_style: self.token_style,
            occurrences: if self.all_occurrences {
                Occurrences::All
            } else {
                Occurrences::First
            },
            date_format: DateFormat::new(&self.locale, &self.date_pattern)?,
            content_part: self.content_part.clone(),
        })
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            template_library: self.template_library.clone(),
            target_list: self.target_list.clone(),
            export_type: self.export_type,
            export_format: self.export_format.clone(),
            export_filename: self.export_filename.clone(),
            export_path: self.export_path.clone(),
        }
    }
}
