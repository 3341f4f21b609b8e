// std
use std::f32::consts::PI;
use std::path::PathBuf;
use std::time::Instant;
// others
use clap::Parser;
use log::{error, info};
// pbrt
use rs_accel::accelerators::{intersect_brute_force, AccelType, Accelerator};
use rs_accel::blockqueue::BlockQueue;
use rs_accel::core::error::Result;
use rs_accel::core::geometry::{Bounds3f, Point3f, Ray, Vector3f};
use rs_accel::core::interaction::Hitpoint;
use rs_accel::core::pbrt::Float;
use rs_accel::core::rng::Rng;
use rs_accel::shapes::triangle::Triangle;
use rs_accel::shapes::trimesh::TriangleMesh;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of rays a worker traces before reporting back.
const RAYS_PER_BLOCK: usize = 1024;
/// Edge length of the triangles in a random soup.
const SOUP_TRIANGLE_SIZE: Float = 0.1;
/// Random rays start on a sphere of this radius around the scene.
const RAY_ORIGIN_RADIUS: Float = 3.0;

/// Build a ray accelerator over a PLY mesh (or a random triangle
/// soup) and shoot random rays at it.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// PLY file to read the triangles from
    path: Option<PathBuf>,
    /// acceleration structure: kdtree, bbvh or qbvh
    #[arg(short, long, default_value = "qbvh")]
    accel: String,
    /// size of the random triangle soup used without a PLY file
    #[arg(long, default_value_t = 10_000)]
    triangles: usize,
    /// number of random rays to trace
    #[arg(short, long, default_value_t = 100_000)]
    rays: usize,
    /// seed for the random triangles and rays
    #[arg(short, long, default_value_t = 0)]
    seed: u64,
    /// use specified number of threads for tracing
    #[arg(short = 't', long = "nthreads", default_value_t = 0)]
    nthreads: u8,
    /// compare every hit against a test of all triangles
    #[arg(long)]
    validate: bool,
}

/// Small triangles with random orientation scattered in [-1, 1]^3.
fn random_soup(n: usize, rng: &mut Rng) -> Vec<Triangle> {
    let h: Float = SOUP_TRIANGLE_SIZE * 0.5;
    (0..n)
        .map(|_| {
            let c: Point3f = Point3f::new(
                rng.uniform_range(-1.0, 1.0),
                rng.uniform_range(-1.0, 1.0),
                rng.uniform_range(-1.0, 1.0),
            );
            let mut corner = || {
                c + Vector3f::new(
                    rng.uniform_range(-h, h),
                    rng.uniform_range(-h, h),
                    rng.uniform_range(-h, h),
                )
            };
            let p0: Point3f = corner();
            let p1: Point3f = corner();
            let p2: Point3f = corner();
            Triangle::new(p0, p1, p2)
        })
        .collect()
}

/// Rays from a sphere around the scene towards random points inside
/// [-1, 1]^3.
fn random_rays(n: usize, rng: &mut Rng) -> Vec<Ray> {
    (0..n)
        .map(|_| {
            let z: Float = 1.0 - 2.0 * rng.uniform_float();
            let r: Float = (1.0 as Float - z * z).max(0.0).sqrt();
            let phi: Float = 2.0 * PI * rng.uniform_float();
            let o: Point3f = Point3f::new(r * phi.cos(), r * phi.sin(), z) * RAY_ORIGIN_RADIUS;
            let target: Point3f = Point3f::new(
                rng.uniform_range(-1.0, 1.0),
                rng.uniform_range(-1.0, 1.0),
                rng.uniform_range(-1.0, 1.0),
            );
            Ray::new(o, (target - o).normalize())
        })
        .collect()
}

fn load_triangles(args: &Cli, rng: &mut Rng) -> Result<Vec<Triangle>> {
    match args.path {
        Some(ref path) => {
            let mut mesh: TriangleMesh = TriangleMesh::load(path)?;
            mesh.fit_to_bounds(&Bounds3f::new(
                Point3f::new(-1.0, -1.0, -1.0),
                Point3f::new(1.0, 1.0, 1.0),
            ));
            Ok(mesh.triangles())
        }
        None => Ok(random_soup(args.triangles, rng)),
    }
}

struct BlockResult {
    hits: usize,
    mismatches: usize,
}

fn run(args: &Cli) -> Result<()> {
    let accel_type: AccelType = AccelType::from_name(&args.accel)?;
    let mut rng: Rng = Rng::with_sequence(args.seed);
    let triangles: Vec<Triangle> = load_triangles(args, &mut rng)?;
    let rays: Vec<Ray> = random_rays(args.rays, &mut rng);
    let mut accel: Accelerator = Accelerator::new(accel_type);
    let start = Instant::now();
    accel.construct(&triangles);
    println!(
        "Built {} over {} triangles in {:.3} s ({} nodes)",
        accel_type,
        triangles.len(),
        start.elapsed().as_secs_f64(),
        accel.node_count()
    );
    let num_cores: usize = if args.nthreads == 0_u8 {
        num_cpus::get()
    } else {
        args.nthreads as usize
    };
    println!("Tracing {} rays with {} thread(s) ...", rays.len(), num_cores);
    let cull_back_faces: bool = accel_type == AccelType::Qbvh;
    let block_queue: BlockQueue = BlockQueue::new(rays.len(), RAYS_PER_BLOCK);
    let bq = &block_queue;
    let accel = &accel;
    let rays = &rays;
    let triangles = &triangles;
    let validate: bool = args.validate;
    let start = Instant::now();
    let mut total: BlockResult = BlockResult {
        hits: 0,
        mismatches: 0,
    };
    crossbeam::scope(|scope| {
        let (block_tx, block_rx) = crossbeam_channel::bounded(num_cores);
        // spawn worker threads
        for _ in 0..num_cores {
            let block_tx = block_tx.clone();
            scope.spawn(move |_| {
                while let Some(range) = bq.next() {
                    let mut result: BlockResult = BlockResult {
                        hits: 0,
                        mismatches: 0,
                    };
                    for ray in &rays[range] {
                        let mut hit: Hitpoint = Hitpoint::default();
                        let hit_id: Option<usize> = accel.intersect(ray, &mut hit);
                        if hit_id.is_some() {
                            result.hits += 1;
                        }
                        if validate {
                            let mut reference: Hitpoint = Hitpoint::default();
                            let reference_id: Option<usize> =
                                intersect_brute_force(triangles, ray, &mut reference, cull_back_faces);
                            if reference_id != hit_id {
                                result.mismatches += 1;
                            }
                        }
                    }
                    if block_tx.send(result).is_err() {
                        break;
                    }
                }
            });
        }
        drop(block_tx);
        for _ in pbr::PbIter::new(0..bq.len()) {
            match block_rx.recv() {
                Ok(result) => {
                    total.hits += result.hits;
                    total.mismatches += result.mismatches;
                }
                Err(_) => break,
            }
        }
    })
    .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "worker thread panicked"))?;
    let seconds: f64 = start.elapsed().as_secs_f64();
    println!(
        "{} of {} rays hit in {:.3} s ({:.0} rays/s)",
        total.hits,
        rays.len(),
        seconds,
        rays.len() as f64 / seconds.max(1.0e-9)
    );
    if validate {
        if total.mismatches == 0 {
            println!("All rays agree with the brute force test.");
        } else {
            error!(
                "{} of {} rays disagree with the brute force test",
                total.mismatches,
                rays.len()
            );
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    // handle command line options
    let args: Cli = Cli::parse();
    println!(
        "rs_accel version {} [Detected {} cores]",
        VERSION,
        num_cpus::get()
    );
    info!("accelerator {:?}, seed {}", args.accel, args.seed);
    if let Err(e) = run(&args) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
