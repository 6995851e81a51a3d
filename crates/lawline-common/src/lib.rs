pub mod error;
pub mod generator;
pub mod openai;

#[cfg(test)]
mod test_http;
