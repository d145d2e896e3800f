
mod test_engine;
