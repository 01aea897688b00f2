use {
    crate::{pipeline::PassError, util::create_file_buffered},
    common::ir::function::Function,
    log::trace,
    std::{io::Write, path::Path},
};

/// Writes the textual IR of `function` to `<dir>/<function>.<NNN>.<pass>`,
/// where `NNN` is the position of the pass in the pipeline
///
/// Without a dump directory the function is written to the log instead.
pub fn dump_function(
    dir: Option<&Path>,
    index: usize,
    pass: &str,
    function: &Function,
) -> Result<(), PassError> {
    let Some(dir) = dir else {
        trace!("{} after {pass}:\n{function}", function.name());
        return Ok(());
    };

    let path = dir.join(format!("{}.{index:03}.{pass}", function.name()));

    create_file_buffered(&path)
        .and_then(|mut w| {
            write!(w, "{function}")?;
            w.flush()?;
            Ok(())
        })
        .map_err(|report| PassError::Dump {
            function: function.name(),
            path: path.clone(),
            report: format!("{report:#}"),
        })
}
