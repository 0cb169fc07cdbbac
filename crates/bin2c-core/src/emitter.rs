//! C declaration emission.
//!
//! The emitter wraps the element stream produced by [`StreamEncoder`] in one
//! of two declaration shapes:
//!
//! - **Static**: a single header holding a `static` array definition.
//! - **Global**: a source file holding the definition, followed by a header
//!   with an include guard, an `extern` declaration and a size macro.
//!
//! Files are produced strictly one after another through an
//! [`OutputFactory`]. A failure stops the run where it happened; files that
//! were already written are left on disk as they are.
//!
//! ## Extensibility
//!
//! [`OutputFactory`] decides where output goes. [`FsOutputs`] writes to the
//! file system, [`MemoryOutputs`] collects everything in memory.

use crate::encoder::{ElementCount, StreamEncoder};
use crate::error::{Error, Result};
use crate::macro_name::build_macro_name;
use crate::path::{OutputKind, OutputStem};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the generated array: `prefix + symbol + suffix`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayName {
    prefix: Option<String>,
    symbol: String,
    suffix: Option<String>,
}

impl ArrayName {
    /// Creates a name from its core symbol
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            prefix: None,
            symbol: symbol.into(),
            suffix: None,
        }
    }

    /// Sets the prefix prepended to the symbol
    pub fn prefix(mut self, prefix: Option<impl Into<String>>) -> Self {
        self.prefix = prefix.map(Into::into);
        self
    }

    /// Sets the suffix appended to the symbol
    pub fn suffix(mut self, suffix: Option<impl Into<String>>) -> Self {
        self.suffix = suffix.map(Into::into);
        self
    }

    /// Returns the core symbol, usually the input file name without extension
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the prefix, if any
    pub fn prefix_str(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns the suffix, if any
    pub fn suffix_str(&self) -> Option<&str> {
        self.suffix.as_deref()
    }
}

impl fmt::Display for ArrayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            f.write_str(prefix)?;
        }
        f.write_str(&self.symbol)?;
        if let Some(suffix) = &self.suffix {
            f.write_str(suffix)?;
        }
        Ok(())
    }
}

/// Linkage and file layout of the generated array
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationShape {
    /// One header with a file-scope definition
    Static,
    /// Source definition plus a header with declaration and size macro
    Global {
        /// Appended to the upper-cased array name to form the size macro
        length_suffix: String,
    },
}

impl DeclarationShape {
    /// Selects the shape from an optional size macro suffix
    pub fn from_length_suffix(length_suffix: Option<String>) -> Self {
        match length_suffix {
            Some(length_suffix) => DeclarationShape::Global { length_suffix },
            None => DeclarationShape::Static,
        }
    }

    /// Returns true for the global shape
    pub fn is_global(&self) -> bool {
        matches!(self, DeclarationShape::Global { .. })
    }
}

/// Macro identifiers written into a global header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMacros {
    /// Upper-cased symbol, wrapped as `__GUARD_H__`
    pub guard: String,
    /// Upper-cased `prefix + symbol + length_suffix`
    pub size: String,
}

impl HeaderMacros {
    /// Builds the include guard and size macro names for an array
    pub fn new(name: &ArrayName, length_suffix: &str) -> Result<Self> {
        Ok(Self {
            guard: build_macro_name(None, name.symbol(), None)?,
            size: build_macro_name(name.prefix_str(), name.symbol(), Some(length_suffix))?,
        })
    }
}

/// Creates and finalizes the outputs of an emit run
pub trait OutputFactory {
    /// Writer handed to the emitter for a single file
    type Output: Write;

    /// Opens a fresh output for `path`
    fn create(&mut self, path: &Path) -> io::Result<Self::Output>;

    /// Flushes and closes an output once everything has been written
    fn finish(&mut self, output: Self::Output, path: &Path) -> io::Result<()>;
}

/// Writes outputs to the file system, truncating existing files
#[derive(Debug, Clone, Copy, Default)]
pub struct FsOutputs;

impl OutputFactory for FsOutputs {
    type Output = BufWriter<File>;

    fn create(&mut self, path: &Path) -> io::Result<Self::Output> {
        File::create(path).map(BufWriter::new)
    }

    fn finish(&mut self, output: Self::Output, _path: &Path) -> io::Result<()> {
        let file = output.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    }
}

/// Collects finished outputs in memory, in creation order
#[derive(Debug, Clone, Default)]
pub struct MemoryOutputs {
    /// Finished files and their contents
    pub files: Vec<(PathBuf, Vec<u8>)>,
}

impl MemoryOutputs {
    /// Creates an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the contents of a finished file
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&[u8]> {
        let path = path.as_ref();
        self.files
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, contents)| contents.as_slice())
    }
}

impl OutputFactory for MemoryOutputs {
    type Output = Vec<u8>;

    fn create(&mut self, _path: &Path) -> io::Result<Self::Output> {
        Ok(Vec::new())
    }

    fn finish(&mut self, output: Self::Output, path: &Path) -> io::Result<()> {
        self.files.push((path.to_path_buf(), output));
        Ok(())
    }
}

/// Outcome of a successful emit run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitReport {
    /// Number of array elements written
    pub count: ElementCount,
    /// Files written, in creation order
    pub files: Vec<PathBuf>,
}

/// Produces C declarations for a binary stream
#[derive(Debug, Clone, Default)]
pub struct DeclarationEmitter {
    encoder: StreamEncoder,
}

impl DeclarationEmitter {
    /// Creates a new emitter with a default encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new emitter with a custom encoder
    pub fn with_encoder(encoder: StreamEncoder) -> Self {
        Self { encoder }
    }

    /// Writes `static unsigned char const NAME[] = { ... };` into `sink`
    pub fn write_static_definition<R, W>(
        &self,
        source: &mut R,
        sink: &mut W,
        name: &ArrayName,
    ) -> Result<ElementCount>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        text(sink, 0, format_args!("static unsigned char const {}[] = {{ ", name))?;
        self.write_body(source, sink)
    }

    /// Writes the `#include` line and the global definition into `sink`
    pub fn write_global_definition<R, W>(
        &self,
        source: &mut R,
        sink: &mut W,
        name: &ArrayName,
    ) -> Result<ElementCount>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        text(
            sink,
            0,
            format_args!(
                "#include \"{}.h\"\n\nunsigned char const {}[] = {{ ",
                name.symbol(),
                name
            ),
        )?;
        self.write_body(source, sink)
    }

    fn write_body<R, W>(&self, source: &mut R, sink: &mut W) -> Result<ElementCount>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let count = self.encoder.encode(source, sink)?;
        text(sink, count.get(), format_args!(" }};\n"))?;
        Ok(count)
    }

    /// Emits the declaration files for `source` next to `stem`.
    ///
    /// The static shape writes `stem.h`. The global shape writes `stem.c`,
    /// finishes it, then writes `stem.h`. Macro names are built before any
    /// file is created.
    pub fn emit<R, F>(
        &self,
        source: &mut R,
        name: &ArrayName,
        shape: &DeclarationShape,
        stem: &OutputStem,
        outputs: &mut F,
    ) -> Result<EmitReport>
    where
        R: Read + ?Sized,
        F: OutputFactory,
    {
        match shape {
            DeclarationShape::Static => {
                let path = stem.path(OutputKind::Header);
                let count = write_file(outputs, &path, |out| {
                    self.write_static_definition(source, out, name)
                })?;

                Ok(EmitReport {
                    count,
                    files: vec![path],
                })
            }
            DeclarationShape::Global { length_suffix } => {
                let macros = HeaderMacros::new(name, length_suffix)?;

                let source_path = stem.path(OutputKind::Source);
                let count = write_file(outputs, &source_path, |out| {
                    self.write_global_definition(source, out, name)
                })?;

                let header_path = stem.path(OutputKind::Header);
                write_file(outputs, &header_path, |out| {
                    write_global_header(out, name, &macros, count)
                })?;

                Ok(EmitReport {
                    count,
                    files: vec![source_path, header_path],
                })
            }
        }
    }

    /// Emits the declaration files onto the file system
    pub fn emit_to_files<R>(
        &self,
        source: &mut R,
        name: &ArrayName,
        shape: &DeclarationShape,
        stem: &OutputStem,
    ) -> Result<EmitReport>
    where
        R: Read + ?Sized,
    {
        self.emit(source, name, shape, stem, &mut FsOutputs)
    }
}

/// Writes the guarded header declaring a global array and its size macro
pub fn write_global_header<W>(
    sink: &mut W,
    name: &ArrayName,
    macros: &HeaderMacros,
    count: ElementCount,
) -> Result<()>
where
    W: Write + ?Sized,
{
    text(
        sink,
        0,
        format_args!(
            "#if !defined ( __{guard}_H__ )\n\n#define __{guard}_H__\n\n\
             extern unsigned char const {name}[];\n\n\
             #define {size}  {value}\n\n#endif\n",
            guard = macros.guard,
            name = name,
            size = macros.size,
            value = count.to_literal(),
        ),
    )
}

/// Writes declaration text, reporting failures after `elements` elements
fn text<W>(sink: &mut W, elements: u64, args: fmt::Arguments<'_>) -> Result<()>
where
    W: Write + ?Sized,
{
    sink.write_fmt(args).map_err(|e| Error::StreamWrite {
        offset: elements,
        source: e,
    })
}

/// Creates one output, runs `body` against it and finishes it
fn write_file<F, T>(
    outputs: &mut F,
    path: &Path,
    body: impl FnOnce(&mut F::Output) -> Result<T>,
) -> Result<T>
where
    F: OutputFactory,
{
    debug!("Writing {}", path.display());

    let mut output = outputs
        .create(path)
        .map_err(|e| Error::file_create(path, e))?;

    let value = body(&mut output).map_err(|e| {
        debug!("Aborting {}: {}", path.display(), e);
        e.in_file(path)
    })?;

    outputs
        .finish(output, path)
        .map_err(|e| Error::file_close(path, e))?;

    Ok(value)
}
