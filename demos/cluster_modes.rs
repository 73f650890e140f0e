//! Mean shift on a simple 2D dataset, with and without bin seeding.

use modal::{Clustering, ExecutionPolicy, MeanShift, UniformKernel};

fn main() {
    // Three well-separated clusters in 2D.
    let data: Vec<Vec<f32>> = vec![
        // Cluster A (near origin)
        vec![0.0, 0.0],
        vec![0.1, 0.2],
        vec![0.2, 0.1],
        vec![-0.1, 0.1],
        // Cluster B (near (5, 5))
        vec![5.0, 5.0],
        vec![5.1, 4.9],
        vec![4.9, 5.1],
        vec![5.2, 5.2],
        // Cluster C (near (10, 0))
        vec![10.0, 0.0],
        vec![10.1, 0.1],
        vec![9.9, -0.1],
        vec![10.2, 0.2],
    ];

    // --- One seed per point ---
    let labels = MeanShift::new(1.0)
        .with_kernel(UniformKernel)
        .fit_predict(&data)
        .unwrap();
    println!("=== Mean shift (bandwidth=1.0) ===");
    for (i, label) in labels.iter().enumerate() {
        println!(
            "  point {:2} ({:5.1}, {:5.1}) => cluster {}",
            i, data[i][0], data[i][1], label
        );
    }

    // --- Bin seeding: one seed per occupied 2h-cell ---
    let result = MeanShift::new(1.0)
        .with_kernel(UniformKernel)
        .with_bin_seeding(true)
        .with_policy(ExecutionPolicy::Sequential)
        .fit(&data)
        .unwrap();
    println!("\n=== Bin-seeded (cell side 2.0) ===");
    println!("  {} seeds iterated, {} modes survived", result.iterations.len(), result.modes.len());
    for (label, mode) in result.modes.iter().enumerate() {
        println!("  mode {} at ({:5.2}, {:5.2})", label, mode[0], mode[1]);
    }
    for (i, label) in result.labels.iter().enumerate() {
        println!(
            "  point {:2} ({:5.1}, {:5.1}) => cluster {}",
            i, data[i][0], data[i][1], label
        );
    }
}
