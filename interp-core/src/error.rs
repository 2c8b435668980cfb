use crate::Shape;

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

/// Main library error type.
#[derive(thiserror::Error)]
pub enum Error {
    // === Shape Errors ===
    #[error("shape mismatch in {op}, lhs: {lhs:?}, rhs: {rhs:?}")]
    ShapeMismatchBinaryOp { lhs: Shape, rhs: Shape, op: &'static str },

    #[error("unexpected number of dims, expected {expected}, got shape {shape:?}")]
    UnexpectedNumberOfDims { expected: usize, shape: Shape },

    #[error("dim out of range, shape: {shape:?}, dim: {dim}, op: {op}")]
    DimOutOfRange { shape: Shape, dim: i64, op: &'static str },

    #[error("duplicate dim index, shape: {shape:?}, dims: {dims:?}, op: {op}")]
    DuplicateDimIndex { shape: Shape, dims: Vec<usize>, op: &'static str },

    // === Resize argument errors ===
    /// The data format does not exist or does not fit the input rank.
    #[error("unknown data format {layout:?}, expected one of NCHW, NHWC, NCDHW, NDHWC")]
    UnknownLayout { layout: String },

    #[error("invalid data format {layout:?} for an input of rank {rank}")]
    InvalidLayout { layout: String, rank: usize },

    /// The scale argument could not be read as numbers.
    #[error("scale should be a float or a list of floats, got {got:?}")]
    ScaleType { got: String },

    #[error("scale should be greater than zero, got {value}")]
    NonPositiveScale { value: f64 },

    #[error("scale has {got} entries, expected 1 or {expected}")]
    ScaleLength { expected: usize, got: usize },

    #[error("unsupported interpolation mode {mode:?}, only 'nearest' is available")]
    UnsupportedMode { mode: String },

    #[error("nearest interpolation expects a 4d or 5d input, got shape {shape:?}")]
    UnexpectedInputRank { shape: Shape },

    /// A computed source coordinate fell outside of the input extent. The oracle does not clamp.
    #[error("source index {index} out of range on spatial axis {axis} with extent {extent}")]
    SourceIndexOutOfRange { axis: usize, index: usize, extent: usize },

    // === Comparison Errors ===
    #[error("{op}: mismatch at index {index}, actual: {actual}, expected: {expected}")]
    NotClose { index: usize, actual: f64, expected: f64, op: &'static str },

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// SafeTensor error.
    #[error(transparent)]
    SafeTensor(#[from] safetensors::SafeTensorError),

    #[error("{context}\n{inner}")]
    Context { inner: Box<Self>, context: Box<dyn std::fmt::Display + Send + Sync> },

    /// Adding path information to an error.
    #[error("path: {path:?} {inner}")]
    WithPath { inner: Box<Self>, path: std::path::PathBuf },

    #[error("{inner}\n{backtrace}")]
    WithBacktrace { inner: Box<Self>, backtrace: Box<std::backtrace::Backtrace> },

    /// User generated error message, typically created via `bail!`.
    #[error("{0}")]
    Msg(String),

    #[error("unwrap none")]
    UnwrapNone,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn bt(self) -> Self {
        let backtrace = std::backtrace::Backtrace::capture();
        match backtrace.status() {
            std::backtrace::BacktraceStatus::Disabled
            | std::backtrace::BacktraceStatus::Unsupported => self,
            _ => Self::WithBacktrace { inner: Box::new(self), backtrace: Box::new(backtrace) },
        }
    }

    pub fn with_path<P: AsRef<std::path::Path>>(self, p: P) -> Self {
        Self::WithPath { inner: Box::new(self), path: p.as_ref().to_path_buf() }
    }

    pub fn context(self, c: impl std::fmt::Display + Send + Sync + 'static) -> Self {
        Self::Context { inner: Box::new(self), context: Box::new(c) }
    }

    /// Strip the backtrace, context and path wrappers to get at the underlying error.
    pub fn root(&self) -> &Self {
        match self {
            Self::WithBacktrace { inner, .. }
            | Self::Context { inner, .. }
            | Self::WithPath { inner, .. } => inner.root(),
            _ => self,
        }
    }
}

#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::Error::Msg(format!($msg).into()).bt())
    };
    ($err:expr $(,)?) => {
        return Err($crate::Error::Msg(format!($err).into()).bt())
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($fmt, $($arg)*).into()).bt())
    };
}

// Taken from anyhow.
pub trait Context<T> {
    /// Wrap the error value with additional context.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Wrap the error value with additional context that is evaluated lazily
    /// only once an error does occur.
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        match self {
            Some(v) => Ok(v),
            None => Err(Error::UnwrapNone.context(context).bt()),
        }
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        match self {
            Some(v) => Ok(v),
            None => Err(Error::UnwrapNone.context(f()).bt()),
        }
    }
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| e.context(context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.context(f()))
    }
}

pub(crate) fn check_same_shape(lhs: &Shape, rhs: &Shape, op: &'static str) -> Result<()> {
    if lhs != rhs {
        Err(Error::ShapeMismatchBinaryOp { lhs: lhs.clone(), rhs: rhs.clone(), op }.bt())
    } else {
        Ok(())
    }
}
