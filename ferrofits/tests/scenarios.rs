use ferrofits::array::{ColumnInfo, Position, Raster, Region, Segment, VecColumn, VecRaster, pos};
use ferrofits::dtype::{AnyValue, Bitpix, Complex32, Complex64, PixelType, RecordType};
use ferrofits::io::{FileMode, MemFits, MemOpenOptions, MemStorage};
use ferrofits::{
    BintableColumns, ColumnKey, FileMemRegions, FileMemSegments, Header, ImageRaster, Record,
    RecordMode, RowChunks,
};
use itertools::Itertools;
use rstest::rstest;

fn create() -> MemFits {
    MemOpenOptions::create().build().unwrap()
}

fn reopen(storage: MemStorage, mode: FileMode) -> MemFits {
    MemOpenOptions::open(storage).with_mode(mode).build().unwrap()
}

#[test]
fn table_survives_reopening_read_only() {
    let ids = VecColumn::from_vec(ColumnInfo::new("ID", "", 1), vec![45i32, 7, 31]).unwrap();
    let positions = VecColumn::from_rows(
        ColumnInfo::new("POS", "deg", 2),
        [[1.5f64, -0.25], [2.0, 3.0], [f64::MAX, f64::MIN_POSITIVE]],
    )
    .unwrap();

    let mut fits = create();
    let ext = fits.append_bintable(&[]).unwrap();
    let mut columns = BintableColumns::new(&mut fits);
    columns.append(&ids).unwrap();
    columns.append(&positions).unwrap();

    let mut fits = reopen(fits.close(), FileMode::Read);
    fits.select(ext).unwrap();
    let mut columns = BintableColumns::new(&mut fits);
    assert_eq!(columns.read_row_count().unwrap(), 3);
    assert_eq!(columns.read::<i32>("ID").unwrap(), ids);
    assert_eq!(columns.read::<f64>("POS").unwrap(), positions);

    let err = columns.write(&ids).unwrap_err();
    assert!(err.is_read_only());
    let err = columns.remove("ID").unwrap_err();
    assert!(err.is_read_only());
}

fn ramp<T: PixelType + RecordType>(shape: &Position) -> VecRaster<T> {
    let size = usize::try_from(shape.shape_size()).unwrap();
    let data = (0..size)
        .map(|i| T::try_from(AnyValue::U8(u8::try_from(i % 100).unwrap())).unwrap())
        .collect();
    Raster::try_new(shape.clone(), data).unwrap()
}

fn raster_round_trip<T: PixelType + RecordType>(shape: &Position) {
    let raster = ramp::<T>(shape);
    let mut fits = create();
    let mut image = ImageRaster::new(&mut fits);
    image.update_type_shape::<T>(shape).unwrap();
    image.write(&raster).unwrap();

    let mut fits = reopen(fits.close(), FileMode::Read);
    let image = ImageRaster::new(&mut fits);
    assert_eq!(image.read_value_type().unwrap(), T::VALUE_TYPE);
    let read = image.read::<T>().unwrap();
    assert_eq!(read.shape(), shape);
    assert_eq!(read, raster);
}

#[rstest]
#[case(pos![])]
#[case(pos![0])]
#[case(pos![7])]
#[case(pos![4, 0, 2])]
#[case(pos![5, 3])]
#[case(pos![3, 4, 5])]
fn rasters_round_trip_for_every_pixel_type(#[case] shape: Position) {
    raster_round_trip::<i8>(&shape);
    raster_round_trip::<u8>(&shape);
    raster_round_trip::<i16>(&shape);
    raster_round_trip::<u16>(&shape);
    raster_round_trip::<i32>(&shape);
    raster_round_trip::<u32>(&shape);
    raster_round_trip::<i64>(&shape);
    raster_round_trip::<u64>(&shape);
    raster_round_trip::<f32>(&shape);
    raster_round_trip::<f64>(&shape);
}

#[test]
fn slices_of_a_cube() {
    let cube = ramp::<i32>(&pos![4, 3, 5]);
    let mut fits = create();
    fits.append_image(Bitpix::I32, &[4, 3, 5]).unwrap();
    let mut image = ImageRaster::new(&mut fits);
    image.write(&cube).unwrap();

    let planes = Region::new(pos![0, 0, 2], pos![-1, -1, 3]).unwrap();
    let slab = image.read_region::<i32>(&planes).unwrap();
    assert_eq!(slab.data(), cube.section_range(2, 3).unwrap().data());

    let plane = cube.section(-1).unwrap().to_owned_raster();
    image.write_at(&pos![0, 0, 0], &plane).unwrap();
    let read = image.read::<i32>().unwrap();
    assert_eq!(read.section(0).unwrap(), plane);
    assert_eq!(read.section(4).unwrap(), cube.section(4).unwrap());
    assert_eq!(read.section_range(1, 3).unwrap(), cube.section_range(1, 3).unwrap());
}

#[test]
fn long_string_record_round_trip() {
    let value = (0..100).map(|i| char::from(b'a' + (i % 26))).collect::<String>();
    let quoted = format!("it's {}", "x".repeat(90));
    let mut fits = create();
    let mut header = Header::new(&mut fits);
    header
        .write(
            &Record::new("LONGSTR", value.clone()).with_comment("long value"),
            RecordMode::CreateUnique,
        )
        .unwrap();
    header
        .write(&Record::new("QUOTED", quoted.clone()), RecordMode::CreateUnique)
        .unwrap();

    let mut fits = reopen(fits.close(), FileMode::Read);
    let header = Header::new(&mut fits);
    let record = header.parse::<String>("LONGSTR").unwrap();
    assert_eq!(record.value, value);
    assert_eq!(record.comment, "long value");
    assert_eq!(header.parse::<String>("QUOTED").unwrap().value, quoted);
    let keywords = header.read_keywords().unwrap();
    assert_eq!(keywords, ["LONGSTRN", "LONGSTR", "QUOTED"]);
    assert!(header.read_all().unwrap().contains("CONTINUE  '"));
}

#[test]
fn typed_records() {
    let mut fits = create();
    let mut header = Header::new(&mut fits);
    header
        .write(&Record::new("FLAG", true), RecordMode::default())
        .unwrap();
    header
        .write(&Record::new("BIG", u64::MAX), RecordMode::default())
        .unwrap();
    header
        .write(
            &Record::new("EXPTIME", 1.5f32)
                .with_unit("s")
                .with_comment("Exposure time"),
            RecordMode::default(),
        )
        .unwrap();
    header
        .write(
            &Record::new("IMPEDANCE", Complex64::new(50.0, -0.5)),
            RecordMode::default(),
        )
        .unwrap();

    assert!(header.parse::<bool>("FLAG").unwrap().value);
    assert_eq!(header.parse::<u64>("BIG").unwrap().value, u64::MAX);
    assert!(header.parse::<i64>("BIG").is_err());
    let exptime = header.parse::<f64>("EXPTIME").unwrap();
    assert_eq!(exptime.value, 1.5);
    assert_eq!(exptime.unit, "s");
    assert_eq!(exptime.comment, "Exposure time");
    assert_eq!(
        header.parse::<Complex32>("IMPEDANCE").unwrap().value,
        Complex32::new(50.0, -0.5)
    );
    assert_eq!(
        header.parse_any("impedance").unwrap().value,
        AnyValue::C64(Complex64::new(50.0, -0.5))
    );
}

#[test]
fn field_edit_round_trip() {
    let info = ColumnInfo::with_shape("FIELD", "", pos![5, 6]);
    let data = (0..90u16).map(f32::from).collect::<Vec<_>>();
    let column = VecColumn::from_vec(info, data).unwrap();
    let mut fits = create();
    fits.append_bintable(&[]).unwrap();
    let mut columns = BintableColumns::new(&mut fits);
    columns.append(&column).unwrap();

    let mut edited = columns.read::<f32>("FIELD").unwrap();
    assert_eq!(edited, column);
    {
        let mut field = edited.field_mut(1).unwrap();
        for i in (0..5).step_by(2) {
            *field.at_mut(&pos![i, i]).unwrap() = 0.0;
        }
    }
    columns.write(&edited).unwrap();

    let read = columns.read::<f32>("FIELD").unwrap();
    let changed = (0..read.element_count())
        .filter(|&i| read.data()[i] != column.data()[i])
        .collect_vec();
    assert_eq!(changed, [30, 42, 54]);
    assert_eq!(read.field(1).unwrap().at(&pos![2, 2]).unwrap(), &0.0);
    assert_eq!(read.field(1).unwrap().at(&pos![1, 1]).unwrap(), &36.0);
}

#[test]
fn negative_indices() {
    let column = VecColumn::from_vec(ColumnInfo::new("V", "", 2), vec![1i16, 2, 3, 4, 5, 6]).unwrap();
    assert_eq!(column.at(-1, 0).unwrap(), column.at(2, 0).unwrap());
    assert_eq!(column.at(-1, -1).unwrap(), &6);
    assert!(column.at(-4, 0).unwrap_err().is_out_of_bounds());
    assert!(column.at(3, 0).unwrap_err().is_out_of_bounds());

    let raster = ramp::<u8>(&pos![3, 2]);
    assert_eq!(raster.at(&pos![-1, -1]).unwrap(), raster.at(&pos![2, 1]).unwrap());
    assert!(raster.at(&pos![-4, 0]).unwrap_err().is_out_of_bounds());
}

#[rstest]
fn chunks_cover_segments_exactly(
    #[values(1, 2, 3, 7, 64)] hint: i64,
    #[values((0, 0), (0, 1), (5, 13), (10, 100))] range: (i64, i64),
) {
    let (front, size) = range;
    let rows = Segment::from_size(front, size);
    let covered = RowChunks::new(rows, hint)
        .unwrap()
        .inspect(|chunk| assert!(chunk.size() >= 1 && chunk.size() <= hint))
        .flat_map(|chunk| chunk.front..=chunk.back)
        .collect_vec();
    assert_eq!(covered, (front..front + size).collect_vec());
}

#[test]
fn mapping_resolution_is_idempotent() {
    let mut regions =
        FileMemRegions::from_memory_region(pos![2, 1], Region::new(pos![0, 0], pos![-1, 3]).unwrap())
            .unwrap();
    regions.resolve(&pos![9, 9], &pos![4, 4]).unwrap();
    let resolved = regions.clone();
    regions.resolve(&pos![1, 1], &pos![1, 1]).unwrap();
    assert_eq!(regions, resolved);
    assert_eq!(regions.shape().unwrap(), pos![5, 4]);

    let mut segments = FileMemSegments::from_file_segment(Segment::new(3, -1), 0);
    segments.resolve(9, 0).unwrap();
    let resolved = segments;
    segments.resolve(0, 0).unwrap();
    assert_eq!(segments, resolved);
    assert_eq!(segments.size(), 7);
}

#[rstest]
#[case(0)]
#[case(3)]
fn empty_transfers_leave_data_untouched(#[case] memory_front: i64) {
    let mut fits = create();
    let pixels = ramp::<i16>(&pos![4, 3]);
    let mut image = ImageRaster::new(&mut fits);
    image.update_type_shape::<i16>(pixels.shape()).unwrap();
    image.write(&pixels).unwrap();
    let source = Raster::try_new(pos![4, 3], vec![-1i16; 12]).unwrap();
    let memory = Region::from_shape(pos![memory_front, 0], &pos![0, 3]).unwrap();
    let regions = FileMemRegions::from_memory_region(Position::zero(2), memory).unwrap();
    image.write_region(&regions, &source).unwrap();
    assert_eq!(image.read::<i16>().unwrap(), pixels);

    fits.append_bintable(&[]).unwrap();
    let values = VecColumn::from_vec(ColumnInfo::new("V", "", 1), vec![1i64, 2, 3]).unwrap();
    let mut columns = BintableColumns::new(&mut fits);
    columns.append(&values).unwrap();
    let other = VecColumn::from_vec(ColumnInfo::new("V", "", 1), vec![9i64; 5]).unwrap();
    let empty = FileMemSegments::from_memory_segment(0, Segment::from_size(memory_front, 0));
    columns.write_segment(empty, &other).unwrap();
    assert_eq!(columns.read::<i64>("V").unwrap(), values);
    assert_eq!(columns.read_row_count().unwrap(), 3);
}

#[test]
fn out_of_range_transfers_are_rejected() {
    let mut fits = create();
    let mut image = ImageRaster::new(&mut fits);
    image.update_type_shape::<f32>(&pos![3, 5]).unwrap();
    let raster = VecRaster::<f32>::new(pos![3, 5]).unwrap();
    let inverted = FileMemRegions::from_file_region(
        Region::new(pos![2, 4], pos![0, 1]).unwrap(),
        Position::zero(2),
    )
    .unwrap();
    assert!(image.write_region(&inverted, &raster).unwrap_err().is_out_of_bounds());
    let past_end = Region::new(pos![0, 6], pos![-1, -1]).unwrap();
    assert!(image.read_region::<f32>(&past_end).unwrap_err().is_out_of_bounds());

    fits.append_bintable(&[]).unwrap();
    let mut columns = BintableColumns::new(&mut fits);
    columns
        .append(&VecColumn::from_vec(ColumnInfo::new("A", "", 1), vec![0u8; 5]).unwrap())
        .unwrap();
    assert!(columns
        .read_segment::<u8>(Segment::new(9, -1), "A")
        .unwrap_err()
        .is_out_of_bounds());
    assert_eq!(columns.read_segment::<u8>(Segment::new(5, -1), "A").unwrap().row_count(), 0);
    let appended = FileMemSegments::from_memory_segment(-1, Segment::whole());
    columns
        .write_segment(appended, &VecColumn::from_vec(ColumnInfo::new("A", "", 1), vec![7u8]).unwrap())
        .unwrap();
    assert_eq!(columns.read::<u8>("A").unwrap().data(), [0, 0, 0, 0, 0, 7]);
}

#[test]
fn mixed_sequences_in_several_hdus() {
    let mut fits = create();
    let mut header = Header::new(&mut fits);
    header
        .write(&Record::new("TELESCOP", "ferrofits"), RecordMode::default())
        .unwrap();

    let table = fits.append_bintable(&[]).unwrap();
    let names = VecColumn::from_vec(
        ColumnInfo::new("NAME", "", 8),
        vec!["alpha".to_string(), "beta".to_string()],
    )
    .unwrap();
    let flags = VecColumn::from_vec(ColumnInfo::new("FLAG", "", 1), vec![true, false]).unwrap();
    let counts = VecColumn::from_vec(ColumnInfo::new("COUNT", "", 1), vec![3u32, 4]).unwrap();
    let mut columns = BintableColumns::new(&mut fits);
    columns.init::<String>(names.info(), -1).unwrap();
    columns.init::<bool>(flags.info(), -1).unwrap();
    columns.init::<u32>(counts.info(), -1).unwrap();
    columns.write_seq(&(&names, &flags, &counts)).unwrap();

    let mut header = Header::new(&mut fits);
    header
        .write(&Record::new("EXTNAME", "CATALOG"), RecordMode::default())
        .unwrap();

    let mut fits = reopen(fits.close(), FileMode::ReadWrite);
    assert_eq!(fits.hdu_count(), 2);
    assert_eq!(
        Header::new(&mut fits).parse::<String>("TELESCOP").unwrap().value,
        "ferrofits"
    );
    fits.select(table).unwrap();
    assert!(!Header::new(&mut fits).has("TELESCOP").unwrap());
    let columns = BintableColumns::new(&mut fits);
    let (read_counts, read_names, read_flags) = columns
        .read_seq::<(u32, String, bool)>(&[
            ColumnKey::from("COUNT"),
            ColumnKey::from(0),
            ColumnKey::from(-2),
        ])
        .unwrap();
    assert_eq!(read_counts.data(), [3, 4]);
    assert_eq!(read_names, names);
    assert_eq!(read_flags, flags);
}
