use std::io::Write;

use super::ElementGeometry;
use crate::time_step::TimeStep;

impl ElementGeometry {
    /// Write the temporary state of every integration point
    pub fn print_output_at(&self, out: &mut dyn Write, tstep: &TimeStep) -> std::io::Result<()> {
        writeln!(
            out,
            "element {} ({:?}) step {} time {:.6e}:",
            self.label(),
            self.kind,
            tstep.number,
            tstep.target_time
        )?;
        for rule in self.integration_rules() {
            for point in rule.points() {
                writeln!(out, "  rule {} point {}:", rule.number(), point.number())?;
                if let Some(status) = point.status() {
                    status.print_output(out)?;
                }
            }
        }
        Ok(())
    }
}
