use anyhow::Result;

////////////////
/// Resolve the worker count: what the user asked for, otherwise what the
/// machine reports
pub fn determine_thread_count(requested: Option<usize>) -> Result<usize> {
    if let Some(requested) = requested {
        return Ok(requested);
    }
    match std::thread::available_parallelism() {
        Ok(total) => Ok(total.get()),
        Err(_) => {
            println!("Could not autodetect the number of threads available. Setting to 1, but it is better if you specify");
            Ok(1)
        }
    }
}
