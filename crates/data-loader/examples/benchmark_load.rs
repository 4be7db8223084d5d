use data_loader::ModelArtifact;
use std::path::Path;
use std::time::Instant;

fn main() {
    let models_dir = Path::new("models");

    println!("Loading model artifacts from {:?}...\n", models_dir);

    let start = Instant::now();
    let (cf, cbf) = ModelArtifact::load_pair(
        &models_dir.join("cf_model.json"),
        &models_dir.join("cbf_model.json"),
    )
    .expect("Failed to load artifacts");
    let elapsed = start.elapsed();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("CF:  {} movies x {} dims", cf.rows(), cf.dimension());
    println!("CBF: {} movies x {} dims", cbf.rows(), cbf.dimension());
    println!("\nPerformance: {:.0} rows/second",
             (cf.rows() + cbf.rows()) as f64 / elapsed.as_secs_f64());
}
