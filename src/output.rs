//! Solution printing.

use std::io::Write;

use crate::error::Result;
use crate::tour::Tour;

/// Vertex the printed order starts from.
pub const START_VERTEX: usize = 1;

/// Writes the tour length, then the vertex order starting at vertex 1,
/// one value per line.
pub fn write_solution<W: Write>(out: &mut W, tour: &Tour) -> Result<()> {
    writeln!(out, "{}", tour.length())?;
    for vertex in tour.starting_from(START_VERTEX)? {
        writeln!(out, "{vertex}")?;
    }
    out.flush()?;
    Ok(())
}
