use vigil_api::GlobPatternSource;
use vigil_core::scanner::StaticGlobPatterns;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    for pattern in StaticGlobPatterns.glob_patterns() {
        println!("{}", pattern);
    }
    Ok(())
}
