use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use shape_config::OutputConfig;

/// Render a serializable response as JSON per the output settings.
pub fn render<T: Serialize>(value: &T, config: &OutputConfig) -> anyhow::Result<String> {
    if !config.pretty {
        return Ok(serde_json::to_string(value)?);
    }

    let indent = vec![b' '; config.indent];
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(&indent);
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Print a serializable response to stdout.
pub fn output<T: Serialize>(value: &T, config: &OutputConfig) -> anyhow::Result<()> {
    let rendered = render(value, config)?;
    println!("{rendered}");
    Ok(())
}
