use {
    color_eyre::eyre::{Context, Result},
    errctx::PathCtx,
    std::{
        fs::File,
        io::BufWriter,
        path::Path,
    },
};

/// Creates the file supplied in `path`.
///
/// If the file at the supplied path already exists it will
/// be overwritten.
pub fn create_file_buffered<P: AsRef<Path>>(path: P) -> Result<BufWriter<File>> {
    File::options()
        .write(true) // we want to write to the file...
        .create(true) // ...creating if it does not exist..
        .truncate(true) // ...and truncate before writing
        .open(path.as_ref())
        .map(BufWriter::new)
        .map_err(PathCtx::f(path))
        .wrap_err("Failed to write to file")
}
