use approx::assert_relative_eq;
use geo::{FIRST_BAND, GeoTransform, MemDriver, MemRaster, Point, RasterDataset, RasterGrid, RasterSize};
use imagecalc::{
    BlockScanner, CentrePixel, Error, InPlaceIterativeEditor, IterationSummary, Matrix, NodataPolicy, Output, OutputSpec, PixelCalculator,
    ScanOptions, WindowScanner,
    algo::{
        self, ApplyEigenvectors, BandMaths, CovarianceMatrixBuilder, DistanceGrowth, LocalVariance, ReplaceValue, Standardise, UNVISITED,
        Variable, WindowMahalanobis,
    },
};
use rand::{Rng, SeedableRng, rngs::StdRng};

fn grid(rows: usize, cols: usize) -> RasterGrid {
    RasterGrid::new(
        RasterSize::with_rows_cols(rows, cols),
        GeoTransform::from_top_left_and_cell_size(Point::new(100.0, 500.0), 25.0, -25.0),
        "EPSG:31370",
    )
}

fn random_raster(name: &str, grid: RasterGrid, bands: usize, rng: &mut StdRng) -> MemRaster {
    let band_data: Vec<Vec<f64>> = (0..bands)
        .map(|_| (0..grid.size().cell_count()).map(|_| rng.random_range(-100.0..100.0)).collect())
        .collect();
    MemRaster::from_bands(name, grid, band_data).expect("valid raster")
}

fn in_memory<'d>(name: &str, driver: &'d MemDriver) -> Option<Output<'d>> {
    Some(Output::new(OutputSpec::in_memory(name), driver))
}

#[test_log::test]
fn misaligned_inputs_are_rejected_before_any_output() -> Result<(), Error> {
    let mut rng = StdRng::seed_from_u64(1);
    let a = random_raster("a", grid(4, 5), 1, &mut rng);
    let other_size = random_raster("b", grid(4, 6), 1, &mut rng);
    let shifted = random_raster(
        "c",
        RasterGrid::new(
            RasterSize::with_rows_cols(4, 5),
            GeoTransform::from_top_left_and_cell_size(Point::new(125.0, 500.0), 25.0, -25.0),
            "EPSG:31370",
        ),
        1,
        &mut rng,
    );

    for other in [&other_size, &shifted] {
        assert!(matches!(
            BlockScanner::new(&[&a, other], ScanOptions::default()),
            Err(Error::GridMismatch { .. })
        ));
        assert!(matches!(
            WindowScanner::new(&[&a, other], 3, ScanOptions::default()),
            Err(Error::GridMismatch { .. })
        ));
        assert!(matches!(
            algo::image_covariance(&a, FIRST_BAND, other, FIRST_BAND, ScanOptions::default()),
            Err(Error::GridMismatch { .. })
        ));
    }

    // the projection is not part of the pixel grid
    let other_projection = MemRaster::from_bands(
        "d",
        RasterGrid::new(a.grid().size(), a.grid().geo_transform(), ""),
        vec![vec![1.0; 20]],
    )?;
    assert!(BlockScanner::new(&[&a, &other_projection], ScanOptions::default()).is_ok());

    let driver = MemDriver::new();
    let mut calc = BandMaths::new(&["a"], &[Variable::new("a", 0)])?;
    let res = BlockScanner::new(&[&a, &other_size], ScanOptions::default())
        .and_then(|scanner| scanner.scan(&mut calc, in_memory("out", &driver)));
    assert!(res.is_err());
    assert_eq!(driver.created_count(), 0);
    Ok(())
}

#[test_log::test]
fn pixel_scan_is_idempotent() -> Result<(), Error> {
    let mut rng = StdRng::seed_from_u64(2);
    let input = random_raster("input", grid(37, 23), 2, &mut rng);
    let driver = MemDriver::new();
    let vars = [Variable::new("x", 0), Variable::new("y", 1)];

    let mut outputs = Vec::new();
    for block_rows in [1, 5, 37, 100] {
        let mut calc = BandMaths::new(&["x * 2 + 1", "max(x, y) - sqrt(abs(y))"], &vars)?;
        let out = BlockScanner::new(&[&input], ScanOptions::builder().block_rows(block_rows).build())?
            .scan(&mut calc, in_memory("out", &driver))?
            .expect("output raster");
        outputs.push((out.read_band(FIRST_BAND)?, out.read_band(geo::band_index(2)?)?));
    }

    assert!(outputs.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(driver.created_count(), 4);
    Ok(())
}

#[test_log::test]
fn window_size_one_equals_pixel_scan() -> Result<(), Error> {
    let mut rng = StdRng::seed_from_u64(3);
    let a = random_raster("a", grid(17, 11), 2, &mut rng);
    let b = random_raster("b", grid(17, 11), 1, &mut rng);
    let driver = MemDriver::new();
    let vars = [Variable::new("a1", 0), Variable::new("a2", 1), Variable::new("b", 2)];
    let expressions = ["a1 * b - a2", "if(a1 > b, 1, 0)"];

    let options = ScanOptions::builder().block_rows(4).build();
    let pixel_out = BlockScanner::new(&[&a, &b], options.clone())?
        .scan(&mut BandMaths::new(&expressions, &vars)?, in_memory("pixel", &driver))?
        .expect("output raster");

    let mut window_calc = CentrePixel::new(BandMaths::new(&expressions, &vars)?);
    let window_out = WindowScanner::new(&[&a, &b], 1, options)?
        .scan(&mut window_calc, in_memory("window", &driver))?
        .expect("output raster");

    for band in [FIRST_BAND, geo::band_index(2)?] {
        assert_eq!(pixel_out.read_band(band)?, window_out.read_band(band)?);
    }

    Ok(())
}

#[test_log::test]
fn image_covariance_matches_closed_form() -> Result<(), Error> {
    let mut rng = StdRng::seed_from_u64(4);
    let a = random_raster("a", grid(29, 31), 1, &mut rng);
    let b = random_raster("b", grid(29, 31), 1, &mut rng);

    let va = a.band_data(FIRST_BAND)?;
    let vb = b.band_data(FIRST_BAND)?;
    let n = va.len() as f64;
    let mean_a = va.iter().sum::<f64>() / n;
    let mean_b = vb.iter().sum::<f64>() / n;
    let expected = va.iter().zip(vb).map(|(a, b)| (a - mean_a) * (b - mean_b)).sum::<f64>() / (n - 1.0);

    let options = ScanOptions::builder().block_rows(7).build();
    let covariance = algo::image_covariance(&a, FIRST_BAND, &b, FIRST_BAND, options.clone())?;
    assert_relative_eq!(covariance, expected, epsilon = 1e-9, max_relative = 1e-12);

    // the covariance of an image with itself is its variance
    let matrix = algo::covariance_matrix(&[&a], NodataPolicy::None, options.clone())?;
    assert_relative_eq!(matrix[(0, 0)], algo::image_covariance(&a, FIRST_BAND, &a, FIRST_BAND, options)?, epsilon = 1e-9);
    Ok(())
}

#[test_log::test]
fn band_maths_over_separate_inputs() -> Result<(), Error> {
    let single = |name: &str, value: f64| MemRaster::from_bands(name, grid(1, 1), vec![vec![value]]);
    let (a, b, c) = (single("a", 3.0)?, single("b", 4.0)?, single("c", 1.0)?);
    let driver = MemDriver::new();

    let vars = [Variable::new("a", 0), Variable::new("b", 1), Variable::new("c", 2)];
    let mut calc = BandMaths::new(&["a + b - c"], &vars)?;
    calc.check_band_count(3)?;

    let out = BlockScanner::new(&[&a, &b, &c], ScanOptions::default())?
        .scan(&mut calc, in_memory("out", &driver))?
        .expect("output raster");

    assert_eq!(out.read_band(FIRST_BAND)?, vec![6.0]);
    assert_eq!(out.grid(), a.grid());
    Ok(())
}

#[test_log::test]
fn band_count_mismatch_is_rejected_before_any_output() -> Result<(), Error> {
    let mut rng = StdRng::seed_from_u64(5);
    let input = random_raster("input", grid(3, 4), 1, &mut rng);
    let driver = MemDriver::new();
    let pixel_scanner = BlockScanner::new(&[&input], ScanOptions::default())?;
    let window_scanner = WindowScanner::new(&[&input], 3, ScanOptions::default())?;

    assert!(matches!(
        pixel_scanner.scan(&mut Standardise::new(vec![0.0, 0.0], vec![1.0, 1.0])?, in_memory("std", &driver)),
        Err(Error::InputBandMismatch { expected: 2, actual: 1 })
    ));
    assert!(matches!(
        pixel_scanner.scan(&mut ReplaceValue::new(2, 0.0, 1.0), in_memory("replace", &driver)),
        Err(Error::InputBandMismatch { expected: 2, actual: 1 })
    ));
    assert!(matches!(
        pixel_scanner.scan(&mut ApplyEigenvectors::new(Matrix::identity(2), 1, None)?, in_memory("pca", &driver)),
        Err(Error::InputBandMismatch { expected: 2, actual: 1 })
    ));
    assert!(matches!(
        window_scanner.scan(&mut LocalVariance::new(2), in_memory("variance", &driver)),
        Err(Error::InputBandMismatch { expected: 2, actual: 1 })
    ));
    assert!(matches!(
        window_scanner.scan(&mut WindowMahalanobis::new(vec![0.0, 0.0], Matrix::identity(2))?, in_memory("mahalanobis", &driver)),
        Err(Error::InputBandMismatch { expected: 2, actual: 1 })
    ));

    let mut centre = CentrePixel::new(BandMaths::new(&["b"], &[Variable::new("b", 1)])?);
    assert!(matches!(
        window_scanner.scan(&mut centre, in_memory("centre", &driver)),
        Err(Error::InvalidBinding(_))
    ));

    assert_eq!(driver.created_count(), 0);

    // matching band counts scan fine
    let out = pixel_scanner
        .scan(&mut Standardise::new(vec![1.0], vec![2.0])?, in_memory("std", &driver))?
        .expect("output raster");
    assert_eq!(out.band_count(), 1);
    Ok(())
}

#[test_log::test]
fn covariance_builder_only_has_side_effects() -> Result<(), Error> {
    #[rustfmt::skip]
    let ds = MemRaster::from_bands(
        "ds",
        grid(2, 3),
        vec![
            vec![1.0, 0.0, 3.0, 0.0, 2.0, 4.0],
            vec![2.0, 0.0, 1.0, 0.0, 5.0, 0.0],
        ],
    )?;

    let means = vec![1.0, 1.0];
    let mut matrix = Matrix::zeros(2, 2);
    let mut builder = CovarianceMatrixBuilder::new(&mut matrix, means.clone())?;
    let out = BlockScanner::new(&[&ds], ScanOptions::builder().block_rows(1).build())?.scan(&mut builder, None)?;
    assert!(out.is_none());
    assert_eq!(builder.sample_count(), 4);

    // the two all zero pixels are skipped, (4, 0) is not all zero
    let mut expected = Matrix::zeros(2, 2);
    for pixel in [[1.0, 2.0], [3.0, 1.0], [2.0, 5.0], [4.0, 0.0]] {
        expected.add_outer_product(&[pixel[0] - means[0], pixel[1] - means[1]]);
    }

    assert_eq!(matrix, expected);
    Ok(())
}

/// Seeds at (1, 2) and (5, 6) in a 7 x 9 raster
fn seeded_raster() -> MemRaster {
    let grid = grid(7, 9);
    let mut values = vec![UNVISITED; grid.size().cell_count()];
    values[9 + 2] = 0.0;
    values[5 * 9 + 6] = 0.0;
    MemRaster::from_bands("distance", grid, vec![values]).expect("valid raster")
}

fn chebyshev_distances() -> Vec<f64> {
    let seeds = [(1isize, 2isize), (5, 6)];
    (0..7isize)
        .flat_map(|r| (0..9isize).map(move |c| (r, c)))
        .map(|(r, c)| {
            seeds
                .iter()
                .map(|&(sr, sc)| (r - sr).abs().max((c - sc).abs()))
                .min()
                .unwrap_or_default() as f64
        })
        .collect()
}

#[test_log::test]
fn distance_growth_wavefront() -> Result<(), Error> {
    let distances = chebyshev_distances();
    let max_distance = distances.iter().copied().fold(0.0, f64::max) as usize;

    let mut ds = seeded_raster();
    let mut editor = InPlaceIterativeEditor::new(&mut ds, 3, ScanOptions::builder().block_rows(2).build())?;
    let mut calc = DistanceGrowth::new();

    for pass in 0..max_distance {
        assert!(editor.run_pass(&mut calc, pass)?);

        // after pass k exactly the cells within distance k + 1 are visited
        let visited_depth = (pass + 1) as f64;
        let values = editor.dataset().read_band(FIRST_BAND)?;
        for (value, &dist) in values.iter().zip(&distances) {
            if dist <= visited_depth {
                assert_eq!(*value, dist);
            } else {
                assert_eq!(*value, UNVISITED);
            }
        }
    }

    assert!(!editor.run_pass(&mut calc, max_distance)?);
    Ok(())
}

#[test_log::test]
fn distance_transform_terminates_after_one_unchanged_pass() -> Result<(), Error> {
    let distances = chebyshev_distances();
    let max_distance = distances.iter().copied().fold(0.0, f64::max) as usize;

    let mut ds = seeded_raster();
    let summary = algo::distance_transform(&mut ds, ScanOptions::builder().block_rows(3).build())?;
    assert_eq!(
        summary,
        IterationSummary {
            passes: max_distance + 1,
            changing_passes: max_distance,
        }
    );

    let resolution = ds.grid().resolution();
    let expected: Vec<f64> = distances.iter().map(|d| d * resolution).collect();
    assert_eq!(ds.band_data(FIRST_BAND)?, expected.as_slice());

    // the number of passes can be bounded
    let mut ds = seeded_raster();
    let options = ScanOptions::builder().max_passes(2).build();
    assert!(matches!(
        algo::distance_transform(&mut ds, options),
        Err(Error::NoConvergence(2))
    ));
    Ok(())
}
