pub mod ast;
pub mod emitter;
pub mod generate;
pub mod lexer;
pub mod parser;
pub mod syntax;

use wasm_bindgen::prelude::*;

use generate::{GenerateError, GenerateOptions, GeneratedFile, generate_schema};
use parser::{ParseError, Parser};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Generation failed: {0}")]
    Generate(#[from] GenerateError),
}

/// Parse entity descriptions and render one configuration file per entity.
pub fn generate(source: &str, options: &GenerateOptions) -> Result<Vec<GeneratedFile>, Error> {
    let schema = Parser::new(source)?.parse()?;
    Ok(generate_schema(&schema, options)?)
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Render entity descriptions to mapping configuration source
#[wasm_bindgen(js_name = "generateMapping")]
pub fn generate_mapping(source: &str, namespace: Option<String>) -> Result<String, String> {
    let options = GenerateOptions {
        namespace,
        usings: true,
    };
    let files = generate(source, &options).map_err(|e| e.to_string())?;

    Ok(files
        .iter()
        .map(|f| f.contents.as_str())
        .collect::<Vec<_>>()
        .join("\n"))
}
