pub use ferrofits_file::*;
pub use {
    ferrofits_array as array, ferrofits_dtype as dtype, ferrofits_error as error,
    ferrofits_io as io,
};
