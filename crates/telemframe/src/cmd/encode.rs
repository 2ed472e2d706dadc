use std::io::Read;

use serde_json::Value;
use telemframe_codec::{Codec, Frame, JsonCodec, MessageWriter};
use tracing::{debug, info};

use crate::cmd::{open_input, open_output, EncodeArgs};
use crate::exit::{codec_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};

pub fn run(args: EncodeArgs) -> CliResult<i32> {
    let codec = Codec::new(args.source.load()?);

    let mut text = String::new();
    open_input(args.input.as_deref())?
        .read_to_string(&mut text)
        .map_err(|err| io_error("failed reading input", err))?;
    let frames = parse_frames(&text)?;

    // Encode everything before writing so a bad frame leaves no partial output.
    let encoded = frames
        .iter()
        .enumerate()
        .map(|(index, frame)| {
            codec
                .encode(frame)
                .map_err(|err| codec_error(&format!("frame {index}"), err))
        })
        .collect::<CliResult<Vec<_>>>()?;

    let mut writer = MessageWriter::new(open_output(args.output.as_deref())?, codec);
    for (index, payload) in encoded.iter().enumerate() {
        debug!(frame = index, bytes = payload.len(), "writing frame");
        writer
            .send(payload)
            .map_err(|err| codec_error("failed writing output", err))?;
    }

    info!(
        frames = encoded.len(),
        bytes = encoded.iter().map(|payload| payload.len()).sum::<usize>(),
        "encoded frames"
    );
    Ok(SUCCESS)
}

/// Parse JSON text frames: either one array of frames, or one frame per line.
pub(crate) fn parse_frames(text: &str) -> CliResult<Vec<Frame>> {
    let json = JsonCodec::new();
    let trimmed = text.trim_start();

    if trimmed.starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(trimmed)
            .map_err(|err| CliError::new(DATA_INVALID, format!("invalid frame array: {err}")))?;
        return values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                json.decode_value(value)
                    .map_err(|err| codec_error(&format!("frame {index}"), err))
            })
            .collect();
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            json.decode(line.as_bytes())
                .map_err(|err| codec_error(&format!("line {}", number + 1), err))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use telemframe_codec::CodecError;

    use super::*;

    #[test]
    fn parses_line_delimited_frames() {
        let text = concat!(
            r#"{"series":[{"key":1,"data_type":"float32","data":[1.0]}]}"#,
            "\n\n",
            r#"{"series":[]}"#,
            "\n"
        );
        let frames = parse_frames(text).unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].contains_key(1));
        assert!(frames[1].is_empty());
    }

    #[test]
    fn parses_frame_array() {
        let text = r#" [{"series":[{"key":2,"data_type":"int8","data":[-1,2]}]}, {"series":[]}]"#;
        let frames = parse_frames(text).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].get(2).unwrap().values::<i8>().unwrap(), vec![-1, 2]);
    }

    #[test]
    fn bad_line_reports_line_number() {
        let text = concat!(
            "{\"series\":[]}\n",
            "{\"series\":[{\"key\":1,\"data_type\":\"uint8\",\"data\":[300]}]}\n",
        );
        let err = parse_frames(text).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("line 2"), "{}", err.message);
    }

    #[test]
    fn unknown_type_is_usage_error() {
        let err = parse_frames(r#"{"series":[{"key":1,"data_type":"text","data":[]}]}"#)
            .unwrap_err();
        let expected = codec_error("line 1", CodecError::Config(String::new())).code;
        assert_eq!(err.code, expected);
    }
}
