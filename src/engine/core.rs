mod convert;
mod error;
mod ffmpeg_cmd;
mod ffmpeg_info;
mod formats;
mod log;
mod paths;
mod scan;
mod types;

pub use convert::{ConversionEngine, RunSettings};
pub use error::{DiscoveryError, FilesystemError};
pub use ffmpeg_cmd::{
    FfmpegInvoker, Transcoder, TranscoderSettings, build_args, build_transcode_cmd,
    format_transcode_cmd,
};
pub use ffmpeg_info::{first_version_line, transcoder_version};
pub use formats::{DEFAULT_INPUT_EXTENSIONS, RecognizedFormatSet, TargetFormat};
pub use log::RunLog;
pub use paths::{map_output_path, relative_dir};
pub use scan::{discover, discover_streaming};
pub use types::{
    AttemptResult, AttemptStatus, ConversionJob, ConversionSummary, EngineEvent, EventSink,
    LogLevel, LogLine, Strategy,
};
