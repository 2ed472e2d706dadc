use telemframe_schema::{LoaderConfig, SchemaCatalog};

use crate::cmd::{load_schema, SchemaArgs};
use crate::exit::{schema_error, CliResult, SUCCESS};
use crate::output::{print_catalog, print_schema, OutputFormat};

pub fn run(args: SchemaArgs, format: OutputFormat) -> CliResult<i32> {
    let source = args.path.display().to_string();

    if args.path.is_dir() {
        let config = LoaderConfig {
            strict_mode: args.strict,
            ..LoaderConfig::default()
        };
        let catalog = SchemaCatalog::from_directory_with_config(&args.path, config)
            .map_err(|err| schema_error(&format!("schema directory {source}"), err))?;
        print_catalog(&source, &catalog, format)?;
        return Ok(SUCCESS);
    }

    let schema = load_schema(&args.path, args.strict)?;
    print_schema(&source, &schema, format)?;
    Ok(SUCCESS)
}
