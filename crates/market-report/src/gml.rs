//! GML Network Export
//!
//! Writes an annotated network as a directed GML graph. An edge A -> B
//! means A follows B.

use market_events::NetworkSnapshot;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ReportError;

/// Render the snapshot as GML text.
pub fn to_gml_string(snapshot: &NetworkSnapshot) -> String {
    let mut out = String::from("graph [\n  directed 1\n");
    for node in &snapshot.nodes {
        out.push_str(&format!(
            "  node [\n    id {id}\n    label \"{id}\"\n    role \"{role}\"\n    bot {bot}\n    quality {quality}\n    feed_len {feed_len}\n  ]\n",
            id = node.id,
            role = node.role,
            bot = u8::from(node.role.is_bot()),
            quality = node.quality,
            feed_len = node.feed_len,
        ));
    }
    for (source, target) in &snapshot.edges {
        out.push_str(&format!(
            "  edge [\n    source {}\n    target {}\n  ]\n",
            source, target
        ));
    }
    out.push_str("]\n");
    out
}

/// Write the snapshot as GML to `writer`.
pub fn write_gml<W: Write>(snapshot: &NetworkSnapshot, writer: &mut W) -> Result<(), ReportError> {
    writer.write_all(to_gml_string(snapshot).as_bytes())?;
    Ok(())
}

/// Write the snapshot to a GML file, creating parent directories.
pub fn export_to_path(snapshot: &NetworkSnapshot, path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    write_gml(snapshot, &mut writer)?;
    writer.flush()?;
    tracing::info!(
        path = %path.display(),
        nodes = snapshot.node_count(),
        edges = snapshot.edge_count(),
        "Exported network"
    );
    Ok(())
}
