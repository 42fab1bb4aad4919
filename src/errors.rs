use failure::Fail;

#[derive(Debug, Fail)]
pub enum NetworkError {
    #[fail(display = "HTTP call to {} failed: {}", url, message)]
    Http { url: String, message: String },

    #[fail(display = "HTTP call to {} failed with code: {}", url, code)]
    BadStatus { url: String, code: u16 },

    #[fail(display = "Unable to parse the response from {}: {}", url, message)]
    Parse { url: String, message: String },

    #[fail(display = "{} returned no Last-Modified header.", url)]
    MissingLastModified { url: String },

    #[fail(display = "Unable to parse Last-Modified value '{}'.", value)]
    BadLastModified { value: String },
}

#[derive(Debug, Fail)]
pub enum DeviceError {
    #[fail(display = "Signal light unavailable: {}", message)]
    Unavailable { message: String },

    #[fail(display = "Signal light I/O failure: {}", message)]
    Io { message: String },
}
