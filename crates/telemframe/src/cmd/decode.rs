use telemframe_codec::{Codec, CodecConfig, MessageReader};
use tracing::info;

use crate::cmd::{open_input, DecodeArgs};
use crate::exit::{codec_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = if args.lenient {
        CodecConfig::lenient()
    } else {
        CodecConfig::default()
    };
    let codec = Codec::with_config(args.source.load()?, config);
    let mut reader = MessageReader::new(open_input(args.input.as_deref())?, codec);

    let mut count = 0usize;
    for (index, frame) in reader.frames().enumerate() {
        let mut frame = frame.map_err(|err| codec_error(&format!("frame {index}"), err))?;
        if let Some(keys) = &args.keys {
            frame.keep_keys(keys);
        }
        print_frame(index, &frame, format)?;
        count += 1;
    }

    info!(frames = count, "decoded frames");
    Ok(SUCCESS)
}
