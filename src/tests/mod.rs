pub mod test_harness;
