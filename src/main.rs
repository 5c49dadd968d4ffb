use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    qiuqian::cli::main()
}
